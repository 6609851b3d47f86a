//! EC2 operations: source instance, default network, AMIs, launch templates

use super::context::AwsContext;
use super::error::{ControlPlaneError, exactly_one, ignore_not_found};
use super::tags::ec2_tag_spec;
use super::types::{
    ImageState, InstancePlacement, LaunchTemplateSpec, NetworkInterfaceShape, SourceInstance, Vpc,
};
use asg_fleet_common::defaults::MARKET_TYPE;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{
    Filter, Image, Instance, InstanceType, LaunchTemplateInstanceMarketOptionsRequest,
    LaunchTemplateInstanceNetworkInterfaceSpecificationRequest,
    LaunchTemplateLicenseConfigurationRequest, LaunchTemplatePlacementRequest, MarketType,
    RequestLaunchTemplateData, ResourceType, Tenancy,
};
use tracing::{debug, info};

/// EC2 client for the image and launch template stages
pub struct Ec2Client {
    pub(crate) client: Client,
}

fn placement_of(instance: &Instance) -> Option<InstancePlacement> {
    instance.placement().map(|p| InstancePlacement {
        availability_zone: p.availability_zone().map(str::to_string),
        affinity: p.affinity().map(str::to_string),
        group_name: p.group_name().map(str::to_string),
        partition_number: p.partition_number(),
        host_id: p.host_id().map(str::to_string),
        tenancy: p.tenancy().map(|t| t.as_str().to_string()),
        host_resource_group_arn: p.host_resource_group_arn().map(str::to_string),
    })
}

fn network_interfaces_of(instance: &Instance) -> Vec<NetworkInterfaceShape> {
    instance
        .network_interfaces()
        .iter()
        .map(|ni| {
            let attachment = ni.attachment();
            NetworkInterfaceShape {
                device_index: attachment.and_then(|a| a.device_index()),
                network_card_index: attachment.and_then(|a| a.network_card_index()),
                description: ni.description().filter(|d| !d.is_empty()).map(str::to_string),
                interface_type: ni.interface_type().map(str::to_string),
                delete_on_termination: attachment.and_then(|a| a.delete_on_termination()),
                associate_public_ip_address: ni.association().is_some(),
            }
        })
        .collect()
}

/// EBS snapshots backing an image's block devices
fn snapshot_ids(image: &Image) -> Vec<String> {
    image
        .block_device_mappings()
        .iter()
        .filter_map(|mapping| mapping.ebs().and_then(|ebs| ebs.snapshot_id()))
        .map(str::to_string)
        .collect()
}

fn launch_template_data(spec: &LaunchTemplateSpec) -> RequestLaunchTemplateData {
    let mut data = RequestLaunchTemplateData::builder()
        .image_id(&spec.image_id)
        .instance_type(InstanceType::from(spec.instance_type.as_str()))
        .set_kernel_id(spec.kernel_id.clone())
        .set_key_name(spec.key_name.clone())
        .instance_market_options(
            LaunchTemplateInstanceMarketOptionsRequest::builder()
                .market_type(MarketType::from(MARKET_TYPE))
                .build(),
        );

    for arn in &spec.license_configuration_arns {
        data = data.license_specifications(
            LaunchTemplateLicenseConfigurationRequest::builder()
                .license_configuration_arn(arn)
                .build(),
        );
    }

    if let Some(p) = &spec.placement {
        data = data.placement(
            LaunchTemplatePlacementRequest::builder()
                .set_availability_zone(p.availability_zone.clone())
                .set_affinity(p.affinity.clone())
                .set_group_name(p.group_name.clone())
                .set_partition_number(p.partition_number)
                .set_host_id(p.host_id.clone())
                .set_tenancy(p.tenancy.as_deref().map(Tenancy::from))
                .set_host_resource_group_arn(p.host_resource_group_arn.clone())
                .build(),
        );
    }

    // Security groups are left out on purpose; they are resolved at launch.
    for ni in &spec.network_interfaces {
        data = data.network_interfaces(
            LaunchTemplateInstanceNetworkInterfaceSpecificationRequest::builder()
                .set_device_index(ni.device_index)
                .set_network_card_index(ni.network_card_index)
                .set_description(ni.description.clone())
                .set_interface_type(ni.interface_type.clone())
                .set_delete_on_termination(ni.delete_on_termination)
                .associate_public_ip_address(ni.associate_public_ip_address)
                .build(),
        );
    }

    data.build()
}

impl Ec2Client {
    /// Create an EC2 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    /// Describe the reference instance; exactly one reservation holding
    /// exactly one instance is expected.
    pub async fn describe_instance(&self, instance_id: &str) -> Result<SourceInstance, ControlPlaneError> {
        const OP: &str = "DescribeInstances";

        let response = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let reservation = exactly_one(response.reservations(), OP, "reservation", instance_id)?;
        let instance = exactly_one(reservation.instances(), OP, "instance", instance_id)?;

        let instance_type = instance
            .instance_type()
            .map(|t| t.as_str().to_string())
            .ok_or(ControlPlaneError::MissingField {
                operation: OP,
                field: "instance type",
            })?;

        debug!(instance_id = %instance_id, instance_type = %instance_type, "Described source instance");

        Ok(SourceInstance {
            instance_id: instance_id.to_string(),
            instance_type,
            kernel_id: instance.kernel_id().map(str::to_string),
            key_name: instance.key_name().map(str::to_string),
            license_configuration_arns: instance
                .licenses()
                .iter()
                .filter_map(|l| l.license_configuration_arn())
                .map(str::to_string)
                .collect(),
            placement: placement_of(instance),
            network_interfaces: network_interfaces_of(instance),
            vpc_id: instance.vpc_id().map(str::to_string),
        })
    }

    /// Find the default VPC of the account in this region
    pub async fn default_vpc(&self) -> Result<Vpc, ControlPlaneError> {
        const OP: &str = "DescribeVpcs";

        let response = self
            .client
            .describe_vpcs()
            .filters(Filter::builder().name("isDefault").values("true").build())
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let vpc = exactly_one(response.vpcs(), OP, "default VPC", "isDefault=true")?;
        let vpc_id = vpc.vpc_id().ok_or(ControlPlaneError::MissingField {
            operation: OP,
            field: "VPC ID",
        })?;

        Ok(Vpc {
            vpc_id: vpc_id.to_string(),
            state: vpc
                .state()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    /// List the subnets of `vpc_id` that are the default for their AZ
    pub async fn default_subnets(&self, vpc_id: &str) -> Result<Vec<String>, ControlPlaneError> {
        const OP: &str = "DescribeSubnets";

        let mut subnet_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_subnets()
                .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
                .filters(Filter::builder().name("default-for-az").values("true").build())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ControlPlaneError::sdk(OP, e))?;

            subnet_ids.extend(
                response
                    .subnets()
                    .iter()
                    .filter(|s| s.default_for_az().unwrap_or(false))
                    .filter_map(|s| s.subnet_id())
                    .map(str::to_string),
            );

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(vpc_id = %vpc_id, count = subnet_ids.len(), "Found default subnets");
        Ok(subnet_ids)
    }

    /// Start creating an AMI from an instance (the instance may reboot)
    pub async fn create_image(
        &self,
        instance_id: &str,
        name: &str,
        tags: &[(&str, String)],
    ) -> Result<String, ControlPlaneError> {
        const OP: &str = "CreateImage";
        info!(instance_id = %instance_id, name = %name, "Creating image");

        let response = self
            .client
            .create_image()
            .instance_id(instance_id)
            .name(name)
            .no_reboot(false)
            .tag_specifications(ec2_tag_spec(ResourceType::Image, tags))
            .tag_specifications(ec2_tag_spec(ResourceType::Snapshot, tags))
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        response
            .image_id()
            .map(str::to_string)
            .ok_or(ControlPlaneError::MissingField {
                operation: OP,
                field: "image ID",
            })
    }

    /// Get the state of an AMI
    pub async fn image_state(&self, image_id: &str) -> Result<ImageState, ControlPlaneError> {
        const OP: &str = "DescribeImages";

        let response = self
            .client
            .describe_images()
            .image_ids(image_id)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        let image = exactly_one(response.images(), OP, "image", image_id)?;
        let state = match image.state() {
            Some(aws_sdk_ec2::types::ImageState::Pending) => ImageState::Pending,
            Some(aws_sdk_ec2::types::ImageState::Available) => ImageState::Available,
            Some(other) => ImageState::Other(other.as_str().to_string()),
            None => ImageState::Other("unknown".to_string()),
        };
        Ok(state)
    }

    /// Deregister an AMI
    ///
    /// Returns Ok(()) if the image was deregistered or doesn't exist.
    pub async fn deregister_image(&self, image_id: &str) -> Result<(), ControlPlaneError> {
        info!(image_id = %image_id, "Deregistering image");

        let result = self
            .client
            .deregister_image()
            .image_id(image_id)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DeregisterImage", e));

        if ignore_not_found(result)?.is_none() {
            debug!(image_id = %image_id, "Image already deregistered");
        }
        Ok(())
    }

    /// Snapshots an image was built from; empty if the image is gone
    pub async fn image_snapshots(&self, image_id: &str) -> Result<Vec<String>, ControlPlaneError> {
        let result = self
            .client
            .describe_images()
            .image_ids(image_id)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DescribeImages", e));

        Ok(ignore_not_found(result)?
            .and_then(|response| response.images().first().map(snapshot_ids))
            .unwrap_or_default())
    }

    /// Delete an EBS snapshot
    ///
    /// Returns Ok(()) if the snapshot was deleted or doesn't exist.
    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ControlPlaneError> {
        info!(snapshot_id = %snapshot_id, "Deleting snapshot");

        let result = self
            .client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DeleteSnapshot", e));

        if ignore_not_found(result)?.is_none() {
            debug!(snapshot_id = %snapshot_id, "Snapshot already deleted");
        }
        Ok(())
    }

    /// Create a spot launch template; returns the template ID
    pub async fn create_launch_template(
        &self,
        name: &str,
        spec: &LaunchTemplateSpec,
        tags: &[(&str, String)],
    ) -> Result<String, ControlPlaneError> {
        const OP: &str = "CreateLaunchTemplate";
        info!(name = %name, image_id = %spec.image_id, "Creating launch template");

        let response = self
            .client
            .create_launch_template()
            .launch_template_name(name)
            .launch_template_data(launch_template_data(spec))
            .tag_specifications(ec2_tag_spec(ResourceType::LaunchTemplate, tags))
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk(OP, e))?;

        response
            .launch_template()
            .and_then(|lt| lt.launch_template_id())
            .map(str::to_string)
            .ok_or(ControlPlaneError::MissingField {
                operation: OP,
                field: "launch template ID",
            })
    }

    /// Delete a launch template
    ///
    /// Returns Ok(()) if the template was deleted or doesn't exist.
    pub async fn delete_launch_template(&self, launch_template_id: &str) -> Result<(), ControlPlaneError> {
        info!(launch_template_id = %launch_template_id, "Deleting launch template");

        let result = self
            .client
            .delete_launch_template()
            .launch_template_id(launch_template_id)
            .send()
            .await
            .map_err(|e| ControlPlaneError::sdk("DeleteLaunchTemplate", e));

        if ignore_not_found(result)?.is_none() {
            debug!(launch_template_id = %launch_template_id, "Launch template already deleted");
        }
        Ok(())
    }
}
