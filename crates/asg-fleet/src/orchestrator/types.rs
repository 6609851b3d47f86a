//! Core types for the orchestrator
//!
//! `ProvisionedResources` is what the pipeline has created so far and what
//! rollback tears down; `FleetSummary` is what a successful run hands back.

use super::rollback::RollbackReport;
use crate::error::ProvisionError;
use asg_fleet_common::{DerivedNames, ResourceKind};
use serde::Serialize;
use thiserror::Error;

/// Resources created during one run.
///
/// A field is set only once the create call returned an identifier, and
/// always before the pipeline starts polling that resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedResources {
    pub image_id: Option<String>,
    pub launch_template_id: Option<String>,
    pub target_group_arn: Option<String>,
    pub load_balancer_arn: Option<String>,
    /// The group is addressed by name, so only record that creation succeeded
    pub auto_scaling_group_created: bool,
}

impl ProvisionedResources {
    pub fn is_empty(&self) -> bool {
        self.image_id.is_none()
            && self.launch_template_id.is_none()
            && self.target_group_arn.is_none()
            && self.load_balancer_arn.is_none()
            && !self.auto_scaling_group_created
    }

    /// Identifier of a recorded resource of `kind`, if there is one.
    pub fn id_of(&self, kind: ResourceKind, names: &DerivedNames) -> Option<String> {
        match kind {
            ResourceKind::Image => self.image_id.clone(),
            ResourceKind::LaunchTemplate => self.launch_template_id.clone(),
            ResourceKind::TargetGroup => self.target_group_arn.clone(),
            ResourceKind::LoadBalancer => self.load_balancer_arn.clone(),
            ResourceKind::AutoScalingGroup => self
                .auto_scaling_group_created
                .then(|| names.auto_scaling_group.clone()),
        }
    }
}

/// Console links for every created artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleLinks {
    pub image: String,
    pub launch_template: String,
    pub target_group: String,
    pub load_balancer: String,
    pub auto_scaling_group: String,
}

/// Everything a successful run created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    pub group_name: String,
    pub region: String,
    pub image_id: String,
    pub launch_template_id: String,
    pub target_group_arn: String,
    pub load_balancer_arn: String,
    pub load_balancer_dns_name: String,
    pub auto_scaling_group_name: String,
    /// `http://<balancer-dns>:<port><health-path>`
    pub health_check_url: String,
    pub links: ConsoleLinks,
}

/// A failed run: the error that stopped it and, when anything could have
/// been created, what rollback did about it.
#[derive(Debug, Error)]
#[error("cannot provision the fleet")]
pub struct ProvisionFailure {
    #[source]
    pub error: ProvisionError,
    pub rollback: Option<RollbackReport>,
}

/// Health check URL served through the load balancer.
pub fn health_check_url(dns_name: &str, port: u16, path: &str) -> String {
    format!("http://{dns_name}:{port}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use asg_fleet_common::derive_names;

    #[test]
    fn test_empty_resources() {
        let resources = ProvisionedResources::default();
        assert!(resources.is_empty());

        let names = derive_names("fleet_a");
        for kind in ResourceKind::CREATION_ORDER {
            assert_eq!(resources.id_of(kind, &names), None);
        }
    }

    #[test]
    fn test_group_id_is_its_name() {
        let names = derive_names("fleet_a");
        let resources = ProvisionedResources {
            auto_scaling_group_created: true,
            ..Default::default()
        };
        assert!(!resources.is_empty());
        assert_eq!(
            resources.id_of(ResourceKind::AutoScalingGroup, &names),
            Some("fleet_a".to_string())
        );
    }

    #[test]
    fn test_health_check_url() {
        assert_eq!(
            health_check_url("fleet-a-1.us-east-2.elb.amazonaws.com", 80, "/health"),
            "http://fleet-a-1.us-east-2.elb.amazonaws.com:80/health"
        );
    }
}
