//! Auto Scaling operations

use super::context::AwsContext;
use super::error::{ControlPlaneError, exactly_one, ignore_not_found};
use super::tags::autoscaling_tags;
use super::types::{AutoScalingGroupSpec, GroupInstance};
use asg_fleet_common::defaults::{GROUP_HEALTH_CHECK_TYPE, METRICS_GRANULARITY};
use aws_sdk_autoscaling::Client;
use aws_sdk_autoscaling::types::LaunchTemplateSpecification;
use tracing::{debug, info};

/// Clamp a count into the i32 range the Auto Scaling API takes.
fn api_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Auto Scaling client
pub struct AutoScalingClient {
    pub(crate) client: Client,
}

impl AutoScalingClient {
    /// Create an Auto Scaling client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.autoscaling_client(),
        }
    }

    /// Create the group with capacity rebalancing and ELB health checks
    pub async fn create_auto_scaling_group(
        &self,
        spec: &AutoScalingGroupSpec,
        tags: &[(&str, String)],
    ) -> Result<(), ControlPlaneError> {
        const OP: &str = "CreateAutoScalingGroup";
        info!(
            name = %spec.name,
            min_size = spec.min_size,
            max_size = spec.max_size,
            desired_capacity = spec.desired_capacity,
            "Creating auto scaling group"
        );

        let grace_secs = i32::try_from(spec.health_check_grace_period.as_secs()).unwrap_or(i32::MAX);

        self.client
            .create_auto_scaling_group()
            .auto_scaling_group_name(&spec.name)
            .min_size(api_count(spec.min_size))
            .max_size(api_count(spec.max_size))
            .desired_capacity(api_count(spec.desired_capacity))
            .capacity_rebalance(true)
            .health_check_type(GROUP_HEALTH_CHECK_TYPE)
            .health_check_grace_period(grace_secs)
            .launch_template(
                LaunchTemplateSpecification::builder()
                    .launch_template_id(&spec.launch_template_id)
                    .build(),
            )
            .target_group_arns(&spec.target_group_arn)
            .vpc_zone_identifier(spec.vpc_zone_identifier())
            .set_tags(Some(autoscaling_tags(OP, tags)?))
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        Ok(())
    }

    /// List the group's member instances
    pub async fn group_instances(&self, group_name: &str) -> Result<Vec<GroupInstance>, ControlPlaneError> {
        const OP: &str = "DescribeAutoScalingGroups";

        let response = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group_name)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let group = exactly_one(response.auto_scaling_groups(), OP, "auto scaling group", group_name)?;

        Ok(group
            .instances()
            .iter()
            .map(|i| GroupInstance {
                instance_id: i.instance_id().unwrap_or_default().to_string(),
                lifecycle_state: i
                    .lifecycle_state()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                health_status: i.health_status().unwrap_or_default().to_string(),
            })
            .collect())
    }

    /// Enable group metrics at one-minute granularity
    pub async fn enable_metrics_collection(&self, group_name: &str) -> Result<(), ControlPlaneError> {
        debug!(group_name = %group_name, "Enabling metrics collection");

        self.client
            .enable_metrics_collection()
            .auto_scaling_group_name(group_name)
            .granularity(METRICS_GRANULARITY)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("EnableMetricsCollection", e))?;

        Ok(())
    }

    /// Force-delete the group, terminating its instances
    ///
    /// Returns Ok(()) if the group was deleted or doesn't exist.
    pub async fn delete_auto_scaling_group(&self, group_name: &str) -> Result<(), ControlPlaneError> {
        info!(group_name = %group_name, "Deleting auto scaling group");

        let result = self
            .client
            .delete_auto_scaling_group()
            .auto_scaling_group_name(group_name)
            .force_delete(true)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DeleteAutoScalingGroup", e));

        if ignore_not_found(result)?.is_none() {
            debug!(group_name = %group_name, "Auto scaling group already deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_count_clamps() {
        assert_eq!(api_count(3), 3);
        assert_eq!(api_count(u32::MAX), i32::MAX);
    }
}
