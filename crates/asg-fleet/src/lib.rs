//! asg-fleet - load-balanced EC2 Auto Scaling fleets from a reference instance
//!
//! Snapshots an instance into an AMI, derives a spot launch template from it,
//! puts an application load balancer and target group in front, and starts
//! an Auto Scaling group that waits until the fleet is healthy. Anything
//! created before a failure is rolled back.

pub mod aws;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod wait;
