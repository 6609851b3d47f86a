//! AWS client modules for fleet provisioning
//!
//! This module provides wrappers around AWS SDK clients for:
//! - EC2: Source instance, default network, AMIs, launch templates
//! - Elastic Load Balancing: Target groups, load balancers, listeners
//! - Auto Scaling: Groups and their member health
//!
//! The pipeline only sees the [`ControlPlane`] trait; [`AwsControlPlane`]
//! is the production implementation.

pub mod autoscaling;
pub mod client;
pub mod context;
pub mod ec2;
pub mod elb;
pub mod error;
pub mod links;
pub mod operations;
pub mod tags;
pub mod types;

pub use client::AwsControlPlane;
pub use context::AwsContext;
pub use error::{AwsError, ControlPlaneError, classify_aws_error, exactly_one, ignore_not_found};
pub use operations::ControlPlane;
#[cfg(test)]
pub use operations::MockControlPlane;
pub use types::{
    AutoScalingGroupSpec, GroupInstance, ImageState, InstancePlacement, LaunchTemplateSpec,
    LoadBalancer, LoadBalancerState, NetworkInterfaceShape, SourceInstance, TargetGroupSpec, Vpc,
};
