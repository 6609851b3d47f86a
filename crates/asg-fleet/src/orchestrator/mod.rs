//! Provisioning orchestration
//!
//! The pipeline creates the fleet stage by stage, rollback tears down a
//! partial fleet after a failure, and report renders the outcome.

pub mod pipeline;
pub mod report;
pub mod rollback;
pub mod types;

pub use pipeline::{FleetPlan, plan_fleet, provision_fleet};
pub use rollback::{DeleteStatus, RollbackOutcome, RollbackReport, rollback};
pub use types::{ConsoleLinks, FleetSummary, ProvisionFailure, ProvisionedResources};
