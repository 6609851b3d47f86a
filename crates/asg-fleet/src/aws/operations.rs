//! Control plane trait for testing
//!
//! The pipeline and rollback only ever talk to AWS through [`ControlPlane`],
//! so orchestration logic can be unit tested without hitting real AWS.

use super::error::ControlPlaneError;
use super::types::{
    AutoScalingGroupSpec, GroupInstance, ImageState, LaunchTemplateSpec, LoadBalancer,
    SourceInstance, TargetGroupSpec, Vpc,
};

/// Create/describe/delete operations for every fleet resource kind, plus
/// the read-only inventory lookups the pipeline needs.
///
/// Create calls are issued once and never retried by implementations.
/// Delete calls are idempotent: deleting a resource that is already gone
/// succeeds.
///
/// Note: Some parameters are owned (`Vec<String>`, specs) instead of
/// borrowed to work around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ControlPlane: Send + Sync {
    /// Describe the reference instance
    async fn describe_instance(&self, instance_id: &str) -> Result<SourceInstance, ControlPlaneError>;

    /// Find the account's default VPC
    async fn default_vpc(&self) -> Result<Vpc, ControlPlaneError>;

    /// List the default-for-AZ subnets of a VPC
    async fn default_subnets(&self, vpc_id: &str) -> Result<Vec<String>, ControlPlaneError>;

    /// Start snapshotting an instance into an AMI; returns the image ID
    async fn create_image(&self, instance_id: &str, name: &str) -> Result<String, ControlPlaneError>;

    /// Current state of an AMI
    async fn image_state(&self, image_id: &str) -> Result<ImageState, ControlPlaneError>;

    /// Deregister an AMI and delete the snapshots behind it
    async fn deregister_image(&self, image_id: &str) -> Result<(), ControlPlaneError>;

    /// Create a launch template; returns the template ID
    async fn create_launch_template(
        &self,
        name: &str,
        spec: LaunchTemplateSpec,
    ) -> Result<String, ControlPlaneError>;

    /// Delete a launch template
    async fn delete_launch_template(&self, launch_template_id: &str) -> Result<(), ControlPlaneError>;

    /// Create a target group; returns its ARN
    async fn create_target_group(&self, spec: TargetGroupSpec) -> Result<String, ControlPlaneError>;

    /// Delete a target group
    async fn delete_target_group(&self, target_group_arn: &str) -> Result<(), ControlPlaneError>;

    /// Start creating an internet-facing application load balancer
    async fn create_load_balancer(
        &self,
        name: &str,
        subnet_ids: Vec<String>,
    ) -> Result<LoadBalancer, ControlPlaneError>;

    /// Current description of a load balancer
    async fn describe_load_balancer(
        &self,
        load_balancer_arn: &str,
    ) -> Result<LoadBalancer, ControlPlaneError>;

    /// Attach an HTTP listener forwarding everything to one target group
    async fn create_listener(
        &self,
        load_balancer_arn: &str,
        target_group_arn: &str,
        port: u16,
    ) -> Result<String, ControlPlaneError>;

    /// Delete a load balancer and its listeners
    async fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), ControlPlaneError>;

    /// Create an Auto Scaling group
    async fn create_auto_scaling_group(&self, spec: AutoScalingGroupSpec) -> Result<(), ControlPlaneError>;

    /// Members of an Auto Scaling group
    async fn auto_scaling_group_instances(
        &self,
        group_name: &str,
    ) -> Result<Vec<GroupInstance>, ControlPlaneError>;

    /// Turn on group metrics collection
    async fn enable_metrics_collection(&self, group_name: &str) -> Result<(), ControlPlaneError>;

    /// Force-delete an Auto Scaling group along with its instances
    async fn delete_auto_scaling_group(&self, group_name: &str) -> Result<(), ControlPlaneError>;
}
