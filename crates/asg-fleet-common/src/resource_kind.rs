//! Fleet resource kinds and rollback ordering
//!
//! Resources are created in a fixed order, each depending on the ones
//! before it. Rollback must walk that order backwards.

use serde::Serialize;
use std::fmt;

/// Kinds of AWS resources created for a fleet, in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// AMI snapshotted from the source instance
    Image,
    /// Launch template booting the image
    LaunchTemplate,
    /// ELB target group fleet members register with
    TargetGroup,
    /// Application load balancer (its listener goes away with it)
    LoadBalancer,
    /// Auto Scaling group launching from the template
    AutoScalingGroup,
}

impl ResourceKind {
    /// All kinds in creation order.
    pub const CREATION_ORDER: [ResourceKind; 5] = [
        ResourceKind::Image,
        ResourceKind::LaunchTemplate,
        ResourceKind::TargetGroup,
        ResourceKind::LoadBalancer,
        ResourceKind::AutoScalingGroup,
    ];

    /// Get rollback priority (lower number = delete first)
    ///
    /// The auto scaling group goes first since it holds instances registered
    /// in the target group and references the launch template. The load
    /// balancer's listener references the target group. The image goes last.
    pub fn rollback_priority(self) -> u8 {
        match self {
            ResourceKind::AutoScalingGroup => 0,
            ResourceKind::LoadBalancer => 1,
            ResourceKind::TargetGroup => 2,
            ResourceKind::LaunchTemplate => 3,
            ResourceKind::Image => 4,
        }
    }

    /// All kinds in rollback order.
    pub fn rollback_order() -> [ResourceKind; 5] {
        let mut kinds = Self::CREATION_ORDER;
        kinds.sort_by_key(|k| k.rollback_priority());
        kinds
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::LaunchTemplate => "launch template",
            ResourceKind::TargetGroup => "target group",
            ResourceKind::LoadBalancer => "load balancer",
            ResourceKind::AutoScalingGroup => "auto scaling group",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
