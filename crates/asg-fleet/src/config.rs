//! Configuration types for a provisioning run

use crate::error::ProvisionError;
use crate::wait::PollPolicy;
use garde::Validate;
use std::path::PathBuf;
use std::time::Duration;

/// What to build and from which instance
#[derive(Debug, Clone, Validate)]
pub struct FleetConfig {
    /// Logical group name every artifact name is derived from
    #[garde(length(min = 1))]
    pub group_name: String,
    /// Reference instance to snapshot
    #[garde(length(min = 1))]
    pub instance_id: String,
    /// Desired number of healthy fleet members
    #[garde(range(min = 1))]
    pub size: u32,
}

/// Target group health check and traffic port
#[derive(Debug, Clone, Validate)]
pub struct HealthCheckConfig {
    #[garde(prefix("/"))]
    pub path: String,
    #[garde(range(min = 1))]
    pub port: u16,
    /// Time a new member gets before its health check counts
    #[garde(skip)]
    pub grace_period: Duration,
}

/// Per-stage polling bounds
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub timeout: Duration,
    pub tick: Duration,
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            timeout: self.timeout,
            tick: self.tick,
        }
    }
}

/// AWS configuration overrides
#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    /// AWS region (ambient default chain when unset)
    pub region: Option<String>,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

/// Runtime behavior flags
#[derive(Debug, Clone, Default)]
pub struct RuntimeFlags {
    /// Dry run mode - look up inputs and log the plan without creating anything
    pub dry_run: bool,
    /// Output JSON file path
    pub output: Option<PathBuf>,
}

/// Configuration for a provisioning run
///
/// Composed of focused sub-configs for organization. Built from the command
/// line and fixed before the pipeline starts.
#[derive(Debug, Clone, Validate)]
pub struct RunConfig {
    #[garde(dive)]
    pub fleet: FleetConfig,
    #[garde(dive)]
    pub health_check: HealthCheckConfig,
    #[garde(skip)]
    pub poll: PollConfig,
    #[garde(skip)]
    pub aws: AwsConfig,
    #[garde(skip)]
    pub flags: RuntimeFlags,
}

impl RunConfig {
    /// Check the invariants the pipeline relies on.
    pub fn check(&self) -> Result<(), ProvisionError> {
        self.validate().map_err(|report| ProvisionError::InvalidConfig {
            message: report.to_string(),
        })?;

        if self.poll.timeout < self.poll.tick {
            return Err(ProvisionError::InvalidConfig {
                message: format!(
                    "update timeout {:?} is shorter than the update tick {:?}",
                    self.poll.timeout, self.poll.tick
                ),
            });
        }
        Ok(())
    }

    pub fn group_name(&self) -> &str {
        &self.fleet.group_name
    }

    pub fn dry_run(&self) -> bool {
        self.flags.dry_run
    }
}
