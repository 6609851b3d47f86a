//! The staged provisioning pipeline
//!
//! Stages run strictly in order on the calling task:
//!
//! 1. describe the source instance
//! 2. discover the default VPC and its default subnets
//! 3. create the image and wait for it to become available
//! 4. create the launch template
//! 5. create the target group
//! 6. create the load balancer, wait for it to become active, add the listener
//! 7. create the auto scaling group and wait for enough healthy members
//!
//! The two read-only stages run first so the whole plan can be logged
//! before anything is created. Every created resource is recorded in
//! [`ProvisionedResources`] before it is polled; on any failure the record
//! is handed to [`rollback`].

use super::rollback::rollback;
use super::types::{ConsoleLinks, FleetSummary, ProvisionFailure, ProvisionedResources, health_check_url};
use crate::aws::{
    AutoScalingGroupSpec, ControlPlane, GroupInstance, ImageState, LaunchTemplateSpec, LoadBalancer,
    LoadBalancerState, SourceInstance, TargetGroupSpec, links,
};
use crate::config::RunConfig;
use crate::error::{ProvisionError, Stage};
use crate::wait::{Readiness, wait_until_ready};
use asg_fleet_common::defaults::MARKET_TYPE;
use asg_fleet_common::{DerivedNames, derive_names, validate_all};
use tracing::{error, info, warn};

/// Inputs discovered by the read-only stages
#[derive(Debug, Clone)]
pub struct FleetPlan {
    pub names: DerivedNames,
    pub source: SourceInstance,
    pub vpc_id: String,
    pub subnet_ids: Vec<String>,
}

impl FleetPlan {
    /// Log what a run is about to create.
    pub fn log(&self, config: &RunConfig) {
        info!(
            name = %self.names.image,
            instance_id = %config.fleet.instance_id,
            "Will create an image from the source instance"
        );
        info!(name = %self.names.launch_template, "Will create a launch template");
        info!(
            name = %self.names.target_group,
            vpc_id = %self.vpc_id,
            "Will create a target group"
        );
        info!(
            name = %self.names.load_balancer,
            subnets = %self.subnet_ids.join(", "),
            "Will create a load balancer"
        );
        info!(
            name = %self.names.auto_scaling_group,
            instances = config.fleet.size,
            instance_type = %self.source.instance_type,
            market_type = MARKET_TYPE,
            "Will create an auto scaling group"
        );
    }
}

/// Validate the configuration and every derived name.
///
/// Runs before any remote call, so a failure here has nothing to roll back.
fn prepare(config: &RunConfig) -> Result<DerivedNames, ProvisionError> {
    config.check()?;
    let names = derive_names(config.group_name());
    validate_all(&names)?;
    Ok(names)
}

/// Run validation and the read-only stages without creating anything.
pub async fn plan_fleet<P: ControlPlane>(plane: &P, config: &RunConfig) -> Result<FleetPlan, ProvisionError> {
    let names = prepare(config)?;
    let pipeline = Pipeline::new(plane, config, names);
    let plan = pipeline.discover().await?;
    plan.log(config);
    Ok(plan)
}

/// Provision the whole fleet.
///
/// On failure after validation every resource created so far is rolled
/// back, and the rollback report travels with the error.
pub async fn provision_fleet<P: ControlPlane>(
    plane: &P,
    config: &RunConfig,
) -> Result<FleetSummary, ProvisionFailure> {
    let names = prepare(config).map_err(|error| ProvisionFailure {
        error,
        rollback: None,
    })?;

    let mut pipeline = Pipeline::new(plane, config, names);
    match pipeline.run().await {
        Ok(summary) => Ok(summary),
        Err(error) => {
            error!(stage = ?error.stage(), error = %error, "Provisioning failed, rolling back");
            let report = rollback(plane, &pipeline.resources, &pipeline.names).await;
            Err(ProvisionFailure {
                error,
                rollback: Some(report),
            })
        }
    }
}

/// State of one provisioning run
struct Pipeline<'a, P> {
    plane: &'a P,
    config: &'a RunConfig,
    names: DerivedNames,
    resources: ProvisionedResources,
}

impl<'a, P: ControlPlane> Pipeline<'a, P> {
    fn new(plane: &'a P, config: &'a RunConfig, names: DerivedNames) -> Self {
        Self {
            plane,
            config,
            names,
            resources: ProvisionedResources::default(),
        }
    }

    async fn run(&mut self) -> Result<FleetSummary, ProvisionError> {
        let plan = self.discover().await?;
        plan.log(self.config);

        let image_id = self.create_image(&plan.source).await?;
        let launch_template_id = self.create_launch_template(&image_id, &plan.source).await?;
        let target_group_arn = self.create_target_group(&plan.vpc_id).await?;
        let load_balancer = self
            .create_load_balancer(&plan.subnet_ids, &target_group_arn)
            .await?;
        self.create_auto_scaling_group(&launch_template_id, &target_group_arn, &plan.subnet_ids)
            .await?;

        Ok(self.summary(image_id, launch_template_id, target_group_arn, load_balancer))
    }

    /// Read-only stages: the source instance and the default network.
    async fn discover(&self) -> Result<FleetPlan, ProvisionError> {
        let source = self.describe_source().await?;
        let (vpc_id, subnet_ids) = self.discover_network().await?;

        if let Some(source_vpc) = source.vpc_id.as_deref().filter(|v| *v != vpc_id) {
            warn!(
                source_vpc = %source_vpc,
                default_vpc = %vpc_id,
                "Source instance is not in the default VPC; the fleet will run in the default VPC"
            );
        }

        Ok(FleetPlan {
            names: self.names.clone(),
            source,
            vpc_id,
            subnet_ids,
        })
    }

    async fn describe_source(&self) -> Result<SourceInstance, ProvisionError> {
        let instance_id = &self.config.fleet.instance_id;
        self.plane
            .describe_instance(instance_id)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::DescribeInstance, instance_id, e))
    }

    async fn discover_network(&self) -> Result<(String, Vec<String>), ProvisionError> {
        let vpc = self
            .plane
            .default_vpc()
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::DefaultNetwork, "default VPC", e))?;

        if !vpc.is_available() {
            return Err(ProvisionError::Unavailable {
                stage: Stage::DefaultNetwork,
                resource: vpc.vpc_id,
                reason: format!("default VPC state is {:?}", vpc.state),
            });
        }

        let subnet_ids = self
            .plane
            .default_subnets(&vpc.vpc_id)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::DefaultNetwork, &vpc.vpc_id, e))?;

        if subnet_ids.is_empty() {
            return Err(ProvisionError::Unavailable {
                stage: Stage::DefaultNetwork,
                resource: vpc.vpc_id,
                reason: "no default subnets".to_string(),
            });
        }

        info!(vpc_id = %vpc.vpc_id, subnets = subnet_ids.len(), "Found default network");
        Ok((vpc.vpc_id, subnet_ids))
    }

    async fn create_image(&mut self, source: &SourceInstance) -> Result<String, ProvisionError> {
        let name = &self.names.image;
        let image_id = self
            .plane
            .create_image(&source.instance_id, name)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::Image, name, e))?;
        self.resources.image_id = Some(image_id.clone());
        info!(image_id = %image_id, name = %name, "Image creation started");

        // A describe that does not return exactly one image ends the wait
        // right away instead of being retried like a failed call.
        wait_until_ready(
            self.config.poll.policy(),
            &image_id,
            || self.plane.image_state(&image_id),
            |state: ImageState| {
                info!(image_id = %image_id, state = %state, "Image state");
                match state {
                    ImageState::Available => Readiness::Ready(()),
                    ImageState::Pending => Readiness::Pending,
                    other => Readiness::Failed(other.to_string()),
                }
            },
        )
        .await
        .map_err(|e| ProvisionError::poll(Stage::Image, e))?;

        info!(image_id = %image_id, "Image available");
        Ok(image_id)
    }

    async fn create_launch_template(
        &mut self,
        image_id: &str,
        source: &SourceInstance,
    ) -> Result<String, ProvisionError> {
        let name = &self.names.launch_template;
        let spec = LaunchTemplateSpec::from_instance(image_id, source);
        let launch_template_id = self
            .plane
            .create_launch_template(name, spec)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::LaunchTemplate, name, e))?;
        self.resources.launch_template_id = Some(launch_template_id.clone());

        info!(launch_template_id = %launch_template_id, name = %name, "Launch template created");
        Ok(launch_template_id)
    }

    async fn create_target_group(&mut self, vpc_id: &str) -> Result<String, ProvisionError> {
        let name = &self.names.target_group;
        let spec = TargetGroupSpec {
            name: name.clone(),
            vpc_id: vpc_id.to_string(),
            port: self.config.health_check.port,
            health_check_path: self.config.health_check.path.clone(),
        };
        let target_group_arn = self
            .plane
            .create_target_group(spec)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::TargetGroup, name, e))?;
        self.resources.target_group_arn = Some(target_group_arn.clone());

        info!(target_group_arn = %target_group_arn, name = %name, "Target group created");
        Ok(target_group_arn)
    }

    async fn create_load_balancer(
        &mut self,
        subnet_ids: &[String],
        target_group_arn: &str,
    ) -> Result<LoadBalancer, ProvisionError> {
        let name = &self.names.load_balancer;
        let created = self
            .plane
            .create_load_balancer(name, subnet_ids.to_vec())
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::LoadBalancer, name, e))?;
        let arn = created.arn.clone();
        self.resources.load_balancer_arn = Some(arn.clone());
        info!(load_balancer_arn = %arn, name = %name, "Load balancer creation started");

        let mut active = wait_until_ready(
            self.config.poll.policy(),
            name,
            || self.plane.describe_load_balancer(&arn),
            |lb: LoadBalancer| {
                info!(name = %name, state = %lb.state, "Load balancer state");
                match lb.state.clone() {
                    LoadBalancerState::Active => Readiness::Ready(lb),
                    LoadBalancerState::Provisioning => Readiness::Pending,
                    other => Readiness::Failed(other.to_string()),
                }
            },
        )
        .await
        .map_err(|e| ProvisionError::poll(Stage::LoadBalancer, e))?;

        if active.dns_name.is_empty() {
            active.dns_name = created.dns_name;
        }
        info!(name = %name, dns_name = %active.dns_name, "Load balancer active");

        let port = self.config.health_check.port;
        let listener_arn = self
            .plane
            .create_listener(&arn, target_group_arn, port)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::LoadBalancer, &arn, e))?;
        info!(listener_arn = %listener_arn, port, "Listener created");

        Ok(active)
    }

    async fn create_auto_scaling_group(
        &mut self,
        launch_template_id: &str,
        target_group_arn: &str,
        subnet_ids: &[String],
    ) -> Result<(), ProvisionError> {
        let name = &self.names.auto_scaling_group;
        let needed = self.config.fleet.size;
        let spec = AutoScalingGroupSpec::new(
            name.clone(),
            launch_template_id,
            target_group_arn,
            subnet_ids.to_vec(),
            needed,
            self.config.health_check.grace_period,
        );

        self.plane
            .create_auto_scaling_group(spec)
            .await
            .map_err(|e| ProvisionError::control_plane(Stage::AutoScalingGroup, name, e))?;
        self.resources.auto_scaling_group_created = true;
        info!(name = %name, instances = needed, "Auto scaling group created");

        wait_until_ready(
            self.config.poll.policy(),
            name,
            || self.plane.auto_scaling_group_instances(name),
            |members: Vec<GroupInstance>| {
                let healthy = members
                    .iter()
                    .filter(|m| m.is_in_service_and_healthy())
                    .count();
                info!(
                    name = %name,
                    total = members.len(),
                    healthy,
                    needed,
                    "Auto scaling group members"
                );
                if healthy >= needed as usize {
                    Readiness::Ready(())
                } else {
                    Readiness::Pending
                }
            },
        )
        .await
        .map_err(|e| ProvisionError::poll(Stage::AutoScalingGroup, e))?;

        info!(name = %name, "Auto scaling group healthy");

        if let Err(e) = self.plane.enable_metrics_collection(name).await {
            warn!(name = %name, error = %e, "Cannot enable metrics collection");
        }
        Ok(())
    }

    fn summary(
        &self,
        image_id: String,
        launch_template_id: String,
        target_group_arn: String,
        load_balancer: LoadBalancer,
    ) -> FleetSummary {
        let region = self.config.aws.region.clone().unwrap_or_default();
        let links = ConsoleLinks {
            image: links::image(&region, &image_id),
            launch_template: links::launch_template(&region, &launch_template_id),
            target_group: links::target_group(&region, &target_group_arn),
            load_balancer: links::load_balancer(&region, &self.names.load_balancer),
            auto_scaling_group: links::auto_scaling_group(&region, &self.names.auto_scaling_group),
        };

        FleetSummary {
            group_name: self.config.group_name().to_string(),
            region,
            health_check_url: health_check_url(
                &load_balancer.dns_name,
                self.config.health_check.port,
                &self.config.health_check.path,
            ),
            image_id,
            launch_template_id,
            target_group_arn,
            load_balancer_arn: load_balancer.arn,
            load_balancer_dns_name: load_balancer.dns_name,
            auto_scaling_group_name: self.names.auto_scaling_group.clone(),
            links,
        }
    }
}
