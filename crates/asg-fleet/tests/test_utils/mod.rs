//! Shared test utilities for integration tests
//!
//! `ScriptedControlPlane` is an in-memory control plane: polled states are
//! replayed from scripts (the last entry repeats forever), failures can be
//! injected per operation, and every call is logged so tests can assert on
//! exactly what was created and deleted.

#![allow(dead_code)]

use asg_fleet::aws::{
    AutoScalingGroupSpec, AwsError, ControlPlane, ControlPlaneError, GroupInstance, ImageState,
    LaunchTemplateSpec, LoadBalancer, LoadBalancerState, SourceInstance, TargetGroupSpec, Vpc,
};
use asg_fleet::config::{AwsConfig, FleetConfig, HealthCheckConfig, PollConfig, RunConfig, RuntimeFlags};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const TEST_INSTANCE_ID: &str = "i-0001";
pub const TEST_IMAGE_ID: &str = "ami-0001";
pub const TEST_LAUNCH_TEMPLATE_ID: &str = "lt-0001";
pub const TEST_TARGET_GROUP_ARN: &str =
    "arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/fleet-a/1";
pub const TEST_LOAD_BALANCER_ARN: &str =
    "arn:aws:elasticloadbalancing:us-east-2:123456789012:loadbalancer/app/fleet-a/1";
pub const TEST_DNS_NAME: &str = "fleet-a-1.us-east-2.elb.amazonaws.com";

/// Run configuration used by the scenarios: 10 minute timeout, 1 minute tick.
pub fn test_config(group: &str, instances: u32) -> RunConfig {
    RunConfig {
        fleet: FleetConfig {
            group_name: group.to_string(),
            instance_id: TEST_INSTANCE_ID.to_string(),
            size: instances,
        },
        health_check: HealthCheckConfig {
            path: "/health".to_string(),
            port: 80,
            grace_period: Duration::from_secs(60),
        },
        poll: PollConfig {
            timeout: Duration::from_secs(600),
            tick: Duration::from_secs(60),
        },
        aws: AwsConfig {
            region: Some("us-east-2".to_string()),
            aws_profile: None,
        },
        flags: RuntimeFlags::default(),
    }
}

pub fn member(id: &str, lifecycle_state: &str, health_status: &str) -> GroupInstance {
    GroupInstance {
        instance_id: id.to_string(),
        lifecycle_state: lifecycle_state.to_string(),
        health_status: health_status.to_string(),
    }
}

pub fn healthy(id: &str) -> GroupInstance {
    member(id, "InService", "Healthy")
}

pub fn launching(id: &str) -> GroupInstance {
    member(id, "Pending", "Healthy")
}

fn denied(operation: &'static str) -> ControlPlaneError {
    ControlPlaneError::call(
        operation,
        AwsError::Sdk {
            code: Some("UnauthorizedOperation".to_string()),
            message: "You are not authorized to perform this operation.".to_string(),
        },
    )
}

/// Pop the next scripted value, keeping the last one for every later call.
fn next<T: Clone>(script: &Mutex<VecDeque<T>>) -> T {
    let mut script = script.lock().unwrap();
    if script.len() > 1 {
        script.pop_front().unwrap()
    } else {
        script.front().cloned().expect("script must not be empty")
    }
}

pub struct ScriptedControlPlane {
    image_states: Mutex<VecDeque<Result<ImageState, ()>>>,
    load_balancer_states: Mutex<VecDeque<LoadBalancerState>>,
    group_members: Mutex<VecDeque<Vec<GroupInstance>>>,
    image_missing: bool,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<String>>,
    pub launch_templates: Mutex<Vec<LaunchTemplateSpec>>,
    pub target_groups: Mutex<Vec<TargetGroupSpec>>,
    pub auto_scaling_groups: Mutex<Vec<AutoScalingGroupSpec>>,
}

impl Default for ScriptedControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedControlPlane {
    /// Everything succeeds; the image and balancer need one extra poll and
    /// the group comes up with two healthy members on the third poll.
    pub fn new() -> Self {
        Self {
            image_states: Mutex::new(VecDeque::from([Ok(ImageState::Pending), Ok(ImageState::Available)])),
            load_balancer_states: Mutex::new(VecDeque::from([
                LoadBalancerState::Provisioning,
                LoadBalancerState::Active,
            ])),
            group_members: Mutex::new(VecDeque::from([
                vec![launching("i-a"), launching("i-b")],
                vec![healthy("i-a"), launching("i-b")],
                vec![healthy("i-a"), healthy("i-b")],
            ])),
            image_missing: false,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            launch_templates: Mutex::new(Vec::new()),
            target_groups: Mutex::new(Vec::new()),
            auto_scaling_groups: Mutex::new(Vec::new()),
        }
    }

    /// Replace the image state script; `Err(())` yields a throttling error.
    pub fn with_image_states(self, states: Vec<Result<ImageState, ()>>) -> Self {
        *self.image_states.lock().unwrap() = states.into();
        self
    }

    pub fn with_load_balancer_states(self, states: Vec<LoadBalancerState>) -> Self {
        *self.load_balancer_states.lock().unwrap() = states.into();
        self
    }

    /// Describing the image finds no image at all.
    pub fn with_image_missing(mut self) -> Self {
        self.image_missing = true;
        self
    }

    pub fn with_group_members(self, snapshots: Vec<Vec<GroupInstance>>) -> Self {
        *self.group_members.lock().unwrap() = snapshots.into();
        self
    }

    /// Make every call to `operation` (a trait method name) fail.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &'static str) -> Result<(), ControlPlaneError> {
        if self.failing.contains(operation) {
            Err(denied(operation))
        } else {
            Ok(())
        }
    }

    /// Every call in order, as "method arg..." strings
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(method))
            .count()
    }

    /// Delete calls in order
    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("delete_") || c.starts_with("deregister_"))
            .collect()
    }
}

impl ControlPlane for ScriptedControlPlane {
    async fn describe_instance(&self, instance_id: &str) -> Result<SourceInstance, ControlPlaneError> {
        self.record(format!("describe_instance {instance_id}"));
        self.check("describe_instance")?;
        Ok(SourceInstance {
            instance_id: instance_id.to_string(),
            instance_type: "t3.micro".to_string(),
            key_name: Some("ops".to_string()),
            vpc_id: Some("vpc-1".to_string()),
            ..Default::default()
        })
    }

    async fn default_vpc(&self) -> Result<Vpc, ControlPlaneError> {
        self.record("default_vpc".to_string());
        self.check("default_vpc")?;
        Ok(Vpc {
            vpc_id: "vpc-1".to_string(),
            state: "available".to_string(),
        })
    }

    async fn default_subnets(&self, vpc_id: &str) -> Result<Vec<String>, ControlPlaneError> {
        self.record(format!("default_subnets {vpc_id}"));
        self.check("default_subnets")?;
        Ok(vec!["subnet-a".to_string(), "subnet-b".to_string()])
    }

    async fn create_image(&self, instance_id: &str, name: &str) -> Result<String, ControlPlaneError> {
        self.record(format!("create_image {instance_id} {name}"));
        self.check("create_image")?;
        Ok(TEST_IMAGE_ID.to_string())
    }

    async fn image_state(&self, image_id: &str) -> Result<ImageState, ControlPlaneError> {
        self.record(format!("image_state {image_id}"));
        self.check("image_state")?;
        if self.image_missing {
            return Err(ControlPlaneError::Cardinality {
                operation: "DescribeImages",
                resource: "image",
                id: image_id.to_string(),
                count: 0,
            });
        }
        next(&self.image_states).map_err(|()| ControlPlaneError::call("DescribeImages", AwsError::Throttled))
    }

    async fn deregister_image(&self, image_id: &str) -> Result<(), ControlPlaneError> {
        self.record(format!("deregister_image {image_id}"));
        self.check("deregister_image")
    }

    async fn create_launch_template(
        &self,
        name: &str,
        spec: LaunchTemplateSpec,
    ) -> Result<String, ControlPlaneError> {
        self.record(format!("create_launch_template {name}"));
        self.check("create_launch_template")?;
        self.launch_templates.lock().unwrap().push(spec);
        Ok(TEST_LAUNCH_TEMPLATE_ID.to_string())
    }

    async fn delete_launch_template(&self, launch_template_id: &str) -> Result<(), ControlPlaneError> {
        self.record(format!("delete_launch_template {launch_template_id}"));
        self.check("delete_launch_template")
    }

    async fn create_target_group(&self, spec: TargetGroupSpec) -> Result<String, ControlPlaneError> {
        self.record(format!("create_target_group {}", spec.name));
        self.check("create_target_group")?;
        self.target_groups.lock().unwrap().push(spec);
        Ok(TEST_TARGET_GROUP_ARN.to_string())
    }

    async fn delete_target_group(&self, target_group_arn: &str) -> Result<(), ControlPlaneError> {
        self.record(format!("delete_target_group {target_group_arn}"));
        self.check("delete_target_group")
    }

    async fn create_load_balancer(
        &self,
        name: &str,
        subnet_ids: Vec<String>,
    ) -> Result<LoadBalancer, ControlPlaneError> {
        self.record(format!("create_load_balancer {name} {}", subnet_ids.join(",")));
        self.check("create_load_balancer")?;
        Ok(LoadBalancer {
            arn: TEST_LOAD_BALANCER_ARN.to_string(),
            dns_name: TEST_DNS_NAME.to_string(),
            state: LoadBalancerState::Provisioning,
        })
    }

    async fn describe_load_balancer(
        &self,
        load_balancer_arn: &str,
    ) -> Result<LoadBalancer, ControlPlaneError> {
        self.record(format!("describe_load_balancer {load_balancer_arn}"));
        self.check("describe_load_balancer")?;
        Ok(LoadBalancer {
            arn: load_balancer_arn.to_string(),
            dns_name: TEST_DNS_NAME.to_string(),
            state: next(&self.load_balancer_states),
        })
    }

    async fn create_listener(
        &self,
        load_balancer_arn: &str,
        target_group_arn: &str,
        port: u16,
    ) -> Result<String, ControlPlaneError> {
        self.record(format!("create_listener {load_balancer_arn} {target_group_arn} {port}"));
        self.check("create_listener")?;
        Ok("arn:listener".to_string())
    }

    async fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), ControlPlaneError> {
        self.record(format!("delete_load_balancer {load_balancer_arn}"));
        self.check("delete_load_balancer")
    }

    async fn create_auto_scaling_group(&self, spec: AutoScalingGroupSpec) -> Result<(), ControlPlaneError> {
        self.record(format!("create_auto_scaling_group {}", spec.name));
        self.check("create_auto_scaling_group")?;
        self.auto_scaling_groups.lock().unwrap().push(spec);
        Ok(())
    }

    async fn auto_scaling_group_instances(
        &self,
        group_name: &str,
    ) -> Result<Vec<GroupInstance>, ControlPlaneError> {
        self.record(format!("auto_scaling_group_instances {group_name}"));
        self.check("auto_scaling_group_instances")?;
        Ok(next(&self.group_members))
    }

    async fn enable_metrics_collection(&self, group_name: &str) -> Result<(), ControlPlaneError> {
        self.record(format!("enable_metrics_collection {group_name}"));
        self.check("enable_metrics_collection")
    }

    async fn delete_auto_scaling_group(&self, group_name: &str) -> Result<(), ControlPlaneError> {
        self.record(format!("delete_auto_scaling_group {group_name}"));
        self.check("delete_auto_scaling_group")
    }
}
