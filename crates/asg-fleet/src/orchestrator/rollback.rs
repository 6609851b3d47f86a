//! Rollback of a partially provisioned fleet
//!
//! Deletes whatever the pipeline recorded, newest first. A failed delete is
//! logged and reported but never stops the remaining deletes.

use super::types::ProvisionedResources;
use crate::aws::{ControlPlane, ControlPlaneError};
use asg_fleet_common::{DerivedNames, ResourceKind};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tracing::{info, warn};

/// Result of deleting one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DeleteStatus {
    Deleted,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackOutcome {
    pub kind: ResourceKind,
    pub id: String,
    #[serde(flatten)]
    pub status: DeleteStatus,
}

/// Per-resource outcomes in the order the deletes were issued
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub outcomes: Vec<RollbackOutcome>,
}

impl RollbackReport {
    /// True when every attempted delete succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RollbackOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeleteStatus::Failed { .. }))
    }
}

impl fmt::Display for RollbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed: Vec<String> = self
            .failures()
            .map(|o| match &o.status {
                DeleteStatus::Failed { message } => format!("cannot delete {} {:?}: {}", o.kind, o.id, message),
                DeleteStatus::Deleted => String::new(),
            })
            .collect();

        if failed.is_empty() {
            write!(f, "deleted {} resource(s)", self.outcomes.len())
        } else {
            write!(f, "{}", failed.join("; "))
        }
    }
}

/// Render an error with its sources on one line.
fn error_chain(err: &ControlPlaneError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

async fn delete<P: ControlPlane>(plane: &P, kind: ResourceKind, id: &str) -> Result<(), ControlPlaneError> {
    match kind {
        ResourceKind::AutoScalingGroup => plane.delete_auto_scaling_group(id).await,
        ResourceKind::LoadBalancer => plane.delete_load_balancer(id).await,
        ResourceKind::TargetGroup => plane.delete_target_group(id).await,
        ResourceKind::LaunchTemplate => plane.delete_launch_template(id).await,
        ResourceKind::Image => plane.deregister_image(id).await,
    }
}

/// Delete every recorded resource in reverse creation order.
///
/// Never fails: each delete is attempted regardless of earlier failures,
/// and a resource that is already gone counts as deleted.
pub async fn rollback<P: ControlPlane>(
    plane: &P,
    resources: &ProvisionedResources,
    names: &DerivedNames,
) -> RollbackReport {
    let mut report = RollbackReport::default();

    for kind in ResourceKind::rollback_order() {
        let Some(id) = resources.id_of(kind, names) else {
            continue;
        };

        info!(kind = %kind, id = %id, "Rolling back");
        let status = match delete(plane, kind, &id).await {
            Ok(()) => DeleteStatus::Deleted,
            Err(e) if e.is_not_found() => DeleteStatus::Deleted,
            Err(e) => {
                let message = error_chain(&e);
                warn!(kind = %kind, id = %id, error = %message, "Rollback delete failed");
                DeleteStatus::Failed { message }
            }
        };
        report.outcomes.push(RollbackOutcome { kind, id, status });
    }

    if report.is_clean() {
        info!(deleted = report.outcomes.len(), "Rollback complete");
    } else {
        warn!(
            failed = report.failures().count(),
            attempted = report.outcomes.len(),
            "Rollback finished with errors"
        );
    }

    report
}
