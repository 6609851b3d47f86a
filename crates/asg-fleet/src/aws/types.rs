//! Control plane request and response types
//!
//! These mirror only the parts of the SDK shapes the pipeline needs, so the
//! pipeline and its tests never touch SDK builders.

use asg_fleet_common::defaults::MAX_SIZE_FACTOR;
use std::fmt;
use std::time::Duration;

/// Attributes of the reference instance carried into the launch template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInstance {
    pub instance_id: String,
    /// EC2 instance type (e.g., "c7i.large")
    pub instance_type: String,
    pub kernel_id: Option<String>,
    pub key_name: Option<String>,
    pub license_configuration_arns: Vec<String>,
    pub placement: Option<InstancePlacement>,
    pub network_interfaces: Vec<NetworkInterfaceShape>,
    pub vpc_id: Option<String>,
}

/// Placement of the reference instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePlacement {
    pub availability_zone: Option<String>,
    pub affinity: Option<String>,
    pub group_name: Option<String>,
    pub partition_number: Option<i32>,
    pub host_id: Option<String>,
    pub tenancy: Option<String>,
    pub host_resource_group_arn: Option<String>,
}

/// Network interface layout of the reference instance.
///
/// Subnet and security groups are deliberately absent: the group picks the
/// subnet and security groups are resolved at launch time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInterfaceShape {
    pub device_index: Option<i32>,
    pub network_card_index: Option<i32>,
    pub description: Option<String>,
    pub interface_type: Option<String>,
    pub delete_on_termination: Option<bool>,
    pub associate_public_ip_address: bool,
}

/// Launch template contents derived from the image and source instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTemplateSpec {
    pub image_id: String,
    pub instance_type: String,
    pub kernel_id: Option<String>,
    pub key_name: Option<String>,
    pub license_configuration_arns: Vec<String>,
    pub placement: Option<InstancePlacement>,
    pub network_interfaces: Vec<NetworkInterfaceShape>,
}

impl LaunchTemplateSpec {
    /// Boot `image_id` with the source instance's shape.
    pub fn from_instance(image_id: impl Into<String>, instance: &SourceInstance) -> Self {
        Self {
            image_id: image_id.into(),
            instance_type: instance.instance_type.clone(),
            kernel_id: instance.kernel_id.clone(),
            key_name: instance.key_name.clone(),
            license_configuration_arns: instance.license_configuration_arns.clone(),
            placement: instance.placement.clone(),
            network_interfaces: instance.network_interfaces.clone(),
        }
    }
}

/// The account's default VPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vpc {
    pub vpc_id: String,
    /// VPC state as reported by EC2 ("pending" or "available")
    pub state: String,
}

impl Vpc {
    pub fn is_available(&self) -> bool {
        self.state == "available"
    }
}

/// Target group registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupSpec {
    pub name: String,
    pub vpc_id: String,
    /// Traffic and health-check port
    pub port: u16,
    pub health_check_path: String,
}

/// AMI lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Available,
    Other(String),
}

impl fmt::Display for ImageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageState::Pending => f.write_str("pending"),
            ImageState::Available => f.write_str("available"),
            ImageState::Other(s) => f.write_str(s),
        }
    }
}

/// Load balancer lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadBalancerState {
    Provisioning,
    Active,
    Other(String),
}

impl fmt::Display for LoadBalancerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadBalancerState::Provisioning => f.write_str("provisioning"),
            LoadBalancerState::Active => f.write_str("active"),
            LoadBalancerState::Other(s) => f.write_str(s),
        }
    }
}

/// Load balancer as returned by create and describe calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancer {
    pub arn: String,
    pub dns_name: String,
    pub state: LoadBalancerState,
}

/// Auto Scaling group creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoScalingGroupSpec {
    pub name: String,
    pub launch_template_id: String,
    pub target_group_arn: String,
    pub subnet_ids: Vec<String>,
    pub min_size: u32,
    pub desired_capacity: u32,
    pub max_size: u32,
    pub health_check_grace_period: Duration,
}

impl AutoScalingGroupSpec {
    /// Min and desired capacity are `fleet_size`; max is twice that.
    pub fn new(
        name: impl Into<String>,
        launch_template_id: impl Into<String>,
        target_group_arn: impl Into<String>,
        subnet_ids: Vec<String>,
        fleet_size: u32,
        health_check_grace_period: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            launch_template_id: launch_template_id.into(),
            target_group_arn: target_group_arn.into(),
            subnet_ids,
            min_size: fleet_size,
            desired_capacity: fleet_size,
            max_size: fleet_size.saturating_mul(MAX_SIZE_FACTOR),
            health_check_grace_period,
        }
    }

    /// Subnets joined the way `VPCZoneIdentifier` expects them.
    pub fn vpc_zone_identifier(&self) -> String {
        self.subnet_ids.join(",")
    }
}

/// A member of an Auto Scaling group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInstance {
    pub instance_id: String,
    /// Lifecycle state (e.g., "Pending", "InService")
    pub lifecycle_state: String,
    /// Health status ("Healthy" or "Unhealthy")
    pub health_status: String,
}

impl GroupInstance {
    pub fn is_in_service_and_healthy(&self) -> bool {
        self.lifecycle_state == "InService" && self.health_status == "Healthy"
    }
}
