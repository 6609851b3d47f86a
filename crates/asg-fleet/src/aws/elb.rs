//! Elastic Load Balancing operations: target groups, load balancers, listeners

use super::context::AwsContext;
use super::error::{ControlPlaneError, exactly_one, ignore_not_found};
use super::tags::elb_tags;
use super::types::{LoadBalancer, LoadBalancerState, TargetGroupSpec};
use aws_sdk_elasticloadbalancingv2::Client;
use aws_sdk_elasticloadbalancingv2::types::{
    Action, ActionTypeEnum, ForwardActionConfig, LoadBalancerSchemeEnum, LoadBalancerStateEnum,
    LoadBalancerTypeEnum, ProtocolEnum, TargetGroupTuple,
};
use tracing::{debug, info};

/// Elastic Load Balancing (v2) client
pub struct ElbClient {
    pub(crate) client: Client,
}

fn to_load_balancer(
    lb: &aws_sdk_elasticloadbalancingv2::types::LoadBalancer,
    operation: &'static str,
) -> Result<LoadBalancer, ControlPlaneError> {
    let arn = lb.load_balancer_arn().ok_or(ControlPlaneError::MissingField {
        operation,
        field: "load balancer ARN",
    })?;

    let state = match lb.state().and_then(|s| s.code()) {
        Some(LoadBalancerStateEnum::Provisioning) => LoadBalancerState::Provisioning,
        Some(LoadBalancerStateEnum::Active) => LoadBalancerState::Active,
        Some(other) => LoadBalancerState::Other(other.as_str().to_string()),
        None => LoadBalancerState::Other("unknown".to_string()),
    };

    Ok(LoadBalancer {
        arn: arn.to_string(),
        dns_name: lb.dns_name().unwrap_or_default().to_string(),
        state,
    })
}

/// Default action forwarding all traffic to a single target group.
fn forward_to(target_group_arn: &str) -> Result<Action, ControlPlaneError> {
    Action::builder()
        .r#type(ActionTypeEnum::Forward)
        .forward_config(
            ForwardActionConfig::builder()
                .target_groups(
                    TargetGroupTuple::builder()
                        .target_group_arn(target_group_arn)
                        .weight(1)
                        .build(),
                )
                .build(),
        )
        .build()
        .map_err(|e| ControlPlaneError::invalid_request("CreateListener", e))
}

impl ElbClient {
    /// Create an ELB client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.elb_client(),
        }
    }

    /// Create an HTTP target group with a health check on the traffic port
    pub async fn create_target_group(
        &self,
        spec: &TargetGroupSpec,
        tags: &[(&str, String)],
    ) -> Result<String, ControlPlaneError> {
        const OP: &str = "CreateTargetGroup";
        info!(name = %spec.name, vpc_id = %spec.vpc_id, port = spec.port, "Creating target group");

        let response = self
            .client
            .create_target_group()
            .name(&spec.name)
            .protocol(ProtocolEnum::Http)
            .port(i32::from(spec.port))
            .vpc_id(&spec.vpc_id)
            .health_check_enabled(true)
            .health_check_protocol(ProtocolEnum::Http)
            .health_check_port(spec.port.to_string())
            .health_check_path(&spec.health_check_path)
            .set_tags(Some(elb_tags(OP, tags)?))
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let target_group = exactly_one(response.target_groups(), OP, "target group", &spec.name)?;
        target_group
            .target_group_arn()
            .map(str::to_string)
            .ok_or(ControlPlaneError::MissingField {
                operation: OP,
                field: "target group ARN",
            })
    }

    /// Delete a target group
    ///
    /// Returns Ok(()) if the target group was deleted or doesn't exist.
    pub async fn delete_target_group(&self, target_group_arn: &str) -> Result<(), ControlPlaneError> {
        info!(target_group_arn = %target_group_arn, "Deleting target group");

        let result = self
            .client
            .delete_target_group()
            .target_group_arn(target_group_arn)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DeleteTargetGroup", e));

        if ignore_not_found(result)?.is_none() {
            debug!(target_group_arn = %target_group_arn, "Target group already deleted");
        }
        Ok(())
    }

    /// Start creating an internet-facing application load balancer
    pub async fn create_load_balancer(
        &self,
        name: &str,
        subnet_ids: Vec<String>,
        tags: &[(&str, String)],
    ) -> Result<LoadBalancer, ControlPlaneError> {
        const OP: &str = "CreateLoadBalancer";
        info!(name = %name, subnets = subnet_ids.len(), "Creating load balancer");

        let response = self
            .client
            .create_load_balancer()
            .name(name)
            .r#type(LoadBalancerTypeEnum::Application)
            .scheme(LoadBalancerSchemeEnum::InternetFacing)
            .set_subnets(Some(subnet_ids))
            .set_tags(Some(elb_tags(OP, tags)?))
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let lb = exactly_one(response.load_balancers(), OP, "load balancer", name)?;
        to_load_balancer(lb, OP)
    }

    /// Describe a load balancer by ARN
    pub async fn describe_load_balancer(
        &self,
        load_balancer_arn: &str,
    ) -> Result<LoadBalancer, ControlPlaneError> {
        const OP: &str = "DescribeLoadBalancers";

        let response = self
            .client
            .describe_load_balancers()
            .load_balancer_arns(load_balancer_arn)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let lb = exactly_one(response.load_balancers(), OP, "load balancer", load_balancer_arn)?;
        to_load_balancer(lb, OP)
    }

    /// Create an HTTP listener on `port` forwarding to the target group
    pub async fn create_listener(
        &self,
        load_balancer_arn: &str,
        target_group_arn: &str,
        port: u16,
    ) -> Result<String, ControlPlaneError> {
        const OP: &str = "CreateListener";
        info!(load_balancer_arn = %load_balancer_arn, port, "Creating listener");

        let response = self
            .client
            .create_listener()
            .load_balancer_arn(load_balancer_arn)
            .protocol(ProtocolEnum::Http)
            .port(i32::from(port))
            .default_actions(forward_to(target_group_arn)?)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let listener = exactly_one(response.listeners(), OP, "listener", load_balancer_arn)?;
        listener
            .listener_arn()
            .map(str::to_string)
            .ok_or(ControlPlaneError::MissingField {
                operation: OP,
                field: "listener ARN",
            })
    }

    /// Delete a load balancer (its listeners go with it)
    ///
    /// Returns Ok(()) if the load balancer was deleted or doesn't exist.
    pub async fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), ControlPlaneError> {
        info!(load_balancer_arn = %load_balancer_arn, "Deleting load balancer");

        let result = self
            .client
            .delete_load_balancer()
            .load_balancer_arn(load_balancer_arn)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DeleteLoadBalancer", e));

        if ignore_not_found(result)?.is_none() {
            debug!(load_balancer_arn = %load_balancer_arn, "Load balancer already deleted");
        }
        Ok(())
    }
}
