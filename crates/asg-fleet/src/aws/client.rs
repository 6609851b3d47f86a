//! AWS-backed [`ControlPlane`]

use super::autoscaling::AutoScalingClient;
use super::context::AwsContext;
use super::ec2::Ec2Client;
use super::elb::ElbClient;
use super::error::ControlPlaneError;
use super::operations::ControlPlane;
use super::types::{
    AutoScalingGroupSpec, GroupInstance, ImageState, LaunchTemplateSpec, LoadBalancer,
    SourceInstance, TargetGroupSpec, Vpc,
};
use asg_fleet_common::tags::standard_tags;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff for deletes blocked by dependent resources or throttling.
///
/// A target group stays "in use" for a while after its load balancer is
/// deleted, and a launch template after its group is force-deleted.
fn delete_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(Duration::from_secs(30))
        .with_max_times(8)
}

async fn delete_with_retry<F, Fut>(resource: &'static str, id: &str, delete: F) -> Result<(), ControlPlaneError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), ControlPlaneError>>,
{
    delete
        .retry(delete_backoff())
        .when(|e: &ControlPlaneError| e.is_retryable())
        .notify(|e, dur| {
            warn!(
                resource,
                id = %id,
                delay = ?dur,
                error = %e,
                "Delete failed, retrying..."
            );
        })
        .await
}

/// Control plane backed by the EC2, Elastic Load Balancing and Auto
/// Scaling APIs. Every created resource is tagged for `group_name`.
pub struct AwsControlPlane {
    ec2: Ec2Client,
    elb: ElbClient,
    autoscaling: AutoScalingClient,
    group_name: String,
}

impl AwsControlPlane {
    pub fn from_context(ctx: &AwsContext, group_name: impl Into<String>) -> Self {
        Self {
            ec2: Ec2Client::from_context(ctx),
            elb: ElbClient::from_context(ctx),
            autoscaling: AutoScalingClient::from_context(ctx),
            group_name: group_name.into(),
        }
    }

    fn tags_for(&self, artifact_name: &str) -> Vec<(&'static str, String)> {
        standard_tags(&self.group_name, artifact_name)
    }
}

impl ControlPlane for AwsControlPlane {
    async fn describe_instance(&self, instance_id: &str) -> Result<SourceInstance, ControlPlaneError> {
        self.ec2.describe_instance(instance_id).await
    }

    async fn default_vpc(&self) -> Result<Vpc, ControlPlaneError> {
        self.ec2.default_vpc().await
    }

    async fn default_subnets(&self, vpc_id: &str) -> Result<Vec<String>, ControlPlaneError> {
        self.ec2.default_subnets(vpc_id).await
    }

    async fn create_image(&self, instance_id: &str, name: &str) -> Result<String, ControlPlaneError> {
        self.ec2
            .create_image(instance_id, name, &self.tags_for(name))
            .await
    }

    async fn image_state(&self, image_id: &str) -> Result<ImageState, ControlPlaneError> {
        self.ec2.image_state(image_id).await
    }

    /// Deregister the image, then delete the snapshots it was built from.
    async fn deregister_image(&self, image_id: &str) -> Result<(), ControlPlaneError> {
        let snapshot_ids = self.ec2.image_snapshots(image_id).await?;
        delete_with_retry("image", image_id, || self.ec2.deregister_image(image_id)).await?;

        // A snapshot stays in use until the deregistration settles
        for snapshot_id in &snapshot_ids {
            delete_with_retry("snapshot", snapshot_id, || self.ec2.delete_snapshot(snapshot_id)).await?;
        }
        Ok(())
    }

    async fn create_launch_template(
        &self,
        name: &str,
        spec: LaunchTemplateSpec,
    ) -> Result<String, ControlPlaneError> {
        self.ec2
            .create_launch_template(name, &spec, &self.tags_for(name))
            .await
    }

    async fn delete_launch_template(&self, launch_template_id: &str) -> Result<(), ControlPlaneError> {
        delete_with_retry("launch template", launch_template_id, || {
            self.ec2.delete_launch_template(launch_template_id)
        })
        .await
    }

    async fn create_target_group(&self, spec: TargetGroupSpec) -> Result<String, ControlPlaneError> {
        self.elb
            .create_target_group(&spec, &self.tags_for(&spec.name))
            .await
    }

    async fn delete_target_group(&self, target_group_arn: &str) -> Result<(), ControlPlaneError> {
        delete_with_retry("target group", target_group_arn, || {
            self.elb.delete_target_group(target_group_arn)
        })
        .await
    }

    async fn create_load_balancer(
        &self,
        name: &str,
        subnet_ids: Vec<String>,
    ) -> Result<LoadBalancer, ControlPlaneError> {
        self.elb
            .create_load_balancer(name, subnet_ids, &self.tags_for(name))
            .await
    }

    async fn describe_load_balancer(
        &self,
        load_balancer_arn: &str,
    ) -> Result<LoadBalancer, ControlPlaneError> {
        self.elb.describe_load_balancer(load_balancer_arn).await
    }

    async fn create_listener(
        &self,
        load_balancer_arn: &str,
        target_group_arn: &str,
        port: u16,
    ) -> Result<String, ControlPlaneError> {
        self.elb
            .create_listener(load_balancer_arn, target_group_arn, port)
            .await
    }

    async fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), ControlPlaneError> {
        delete_with_retry("load balancer", load_balancer_arn, || {
            self.elb.delete_load_balancer(load_balancer_arn)
        })
        .await
    }

    async fn create_auto_scaling_group(&self, spec: AutoScalingGroupSpec) -> Result<(), ControlPlaneError> {
        self.autoscaling
            .create_auto_scaling_group(&spec, &self.tags_for(&spec.name))
            .await
    }

    async fn auto_scaling_group_instances(
        &self,
        group_name: &str,
    ) -> Result<Vec<GroupInstance>, ControlPlaneError> {
        self.autoscaling.group_instances(group_name).await
    }

    async fn enable_metrics_collection(&self, group_name: &str) -> Result<(), ControlPlaneError> {
        self.autoscaling.enable_metrics_collection(group_name).await
    }

    async fn delete_auto_scaling_group(&self, group_name: &str) -> Result<(), ControlPlaneError> {
        delete_with_retry("auto scaling group", group_name, || {
            self.autoscaling.delete_auto_scaling_group(group_name)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::error::AwsError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_delete_retries_dependency_violation() {
        let attempts = AtomicU32::new(0);
        let result = delete_with_retry("target group", "arn:tg", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ControlPlaneError::call(
                    "DeleteTargetGroup",
                    AwsError::DependencyViolation {
                        message: "in use by a listener".to_string(),
                    },
                ))
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_does_not_retry_other_errors() {
        let attempts = AtomicU32::new(0);
        let result = delete_with_retry("image", "ami-1", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ControlPlaneError::call(
                "DeregisterImage",
                AwsError::Sdk {
                    code: Some("UnauthorizedOperation".to_string()),
                    message: "denied".to_string(),
                },
            ))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
