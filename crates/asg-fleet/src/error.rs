//! Provisioning errors

use crate::aws::ControlPlaneError;
use crate::wait::PollError;
use asg_fleet_common::ValidationError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    DescribeInstance,
    DefaultNetwork,
    Image,
    LaunchTemplate,
    TargetGroup,
    LoadBalancer,
    AutoScalingGroup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DescribeInstance => "describe-instance",
            Stage::DefaultNetwork => "default-network",
            Stage::Image => "image",
            Stage::LaunchTemplate => "launch-template",
            Stage::TargetGroup => "target-group",
            Stage::LoadBalancer => "load-balancer",
            Stage::AutoScalingGroup => "auto-scaling-group",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A derived name breaks the platform's naming rules
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The run configuration is inconsistent
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A control plane call failed outside a poll loop
    #[error("{stage} stage: call for {resource} failed")]
    Call {
        stage: Stage,
        resource: String,
        #[source]
        source: ControlPlaneError,
    },

    /// A polled resource reached a state it cannot recover from
    #[error("{stage} stage: {resource} reached unexpected state {state:?}")]
    TerminalState {
        stage: Stage,
        resource: String,
        state: String,
    },

    /// A polled resource did not become ready in time
    #[error("{stage} stage: {resource} was not ready after {timeout:?} ({attempts} attempts)")]
    Timeout {
        stage: Stage,
        resource: String,
        timeout: Duration,
        attempts: u32,
    },

    /// A response held other than exactly one matching resource
    #[error("{stage} stage: unexpected response for {resource}")]
    Cardinality {
        stage: Stage,
        resource: String,
        #[source]
        source: ControlPlaneError,
    },

    /// A discovered prerequisite cannot be used
    #[error("{stage} stage: {resource} is unusable: {reason}")]
    Unavailable {
        stage: Stage,
        resource: String,
        reason: String,
    },
}

impl ProvisionError {
    /// Attribute a control plane failure to a stage and resource.
    pub fn control_plane(stage: Stage, resource: impl Into<String>, source: ControlPlaneError) -> Self {
        let resource = resource.into();
        match source {
            ControlPlaneError::Cardinality { .. } => ProvisionError::Cardinality {
                stage,
                resource,
                source,
            },
            _ => ProvisionError::Call {
                stage,
                resource,
                source,
            },
        }
    }

    /// Attribute a poll failure to a stage.
    pub fn poll(stage: Stage, err: PollError) -> Self {
        match err {
            PollError::Timeout {
                resource,
                timeout,
                attempts,
            } => ProvisionError::Timeout {
                stage,
                resource,
                timeout,
                attempts,
            },
            PollError::TerminalState { resource, state } => ProvisionError::TerminalState {
                stage,
                resource,
                state,
            },
            PollError::Fatal { resource, source } => Self::control_plane(stage, resource, source),
        }
    }

    /// Stage the error happened in; `None` for errors raised before any
    /// remote call.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProvisionError::Validation(_) | ProvisionError::InvalidConfig { .. } => None,
            ProvisionError::Call { stage, .. }
            | ProvisionError::TerminalState { stage, .. }
            | ProvisionError::Timeout { stage, .. }
            | ProvisionError::Cardinality { stage, .. }
            | ProvisionError::Unavailable { stage, .. } => Some(*stage),
        }
    }
}
