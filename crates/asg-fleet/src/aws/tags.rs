//! SDK tag builders for fleet resources
//!
//! The tag keys live in `asg_fleet_common::tags`; this module turns the
//! key/value pairs into the tag shapes each AWS service expects.

use super::error::ControlPlaneError;

/// Build an EC2 TagSpecification for `resource_type` from key/value pairs.
pub fn ec2_tag_spec(
    resource_type: aws_sdk_ec2::types::ResourceType,
    tags: &[(&str, String)],
) -> aws_sdk_ec2::types::TagSpecification {
    use aws_sdk_ec2::types::{Tag, TagSpecification};

    let mut builder = TagSpecification::builder().resource_type(resource_type);
    for (key, value) in tags {
        builder = builder.tags(Tag::builder().key(*key).value(value).build());
    }
    builder.build()
}

/// Build Elastic Load Balancing tags from key/value pairs.
pub fn elb_tags(
    operation: &'static str,
    tags: &[(&str, String)],
) -> Result<Vec<aws_sdk_elasticloadbalancingv2::types::Tag>, ControlPlaneError> {
    use aws_sdk_elasticloadbalancingv2::types::Tag;

    tags.iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(*key)
                .value(value)
                .build()
                .map_err(|e| ControlPlaneError::invalid_request(operation, e))
        })
        .collect()
}

/// Build Auto Scaling group tags that propagate to launched instances.
pub fn autoscaling_tags(
    operation: &'static str,
    tags: &[(&str, String)],
) -> Result<Vec<aws_sdk_autoscaling::types::Tag>, ControlPlaneError> {
    use aws_sdk_autoscaling::types::Tag;

    tags.iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(*key)
                .value(value)
                .propagate_at_launch(true)
                .build()
                .map_err(|e| ControlPlaneError::invalid_request(operation, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use asg_fleet_common::tags::{TAG_GROUP, TAG_NAME, standard_tags};

    #[test]
    fn test_ec2_tag_spec_carries_all_tags() {
        let tags = standard_tags("fleet_a", "fleet_a v1");
        let spec = ec2_tag_spec(aws_sdk_ec2::types::ResourceType::Image, &tags);
        assert_eq!(
            spec.resource_type(),
            Some(&aws_sdk_ec2::types::ResourceType::Image)
        );
        assert_eq!(spec.tags().len(), tags.len());
        assert!(
            spec.tags()
                .iter()
                .any(|t| t.key() == Some(TAG_NAME) && t.value() == Some("fleet_a v1"))
        );
    }

    #[test]
    fn test_elb_tags() {
        let tags = standard_tags("fleet_a", "fleet-a");
        let built = elb_tags("CreateTargetGroup", &tags).unwrap();
        assert_eq!(built.len(), tags.len());
        assert!(
            built
                .iter()
                .any(|t| t.key() == TAG_GROUP && t.value() == Some("fleet_a"))
        );
    }

    #[test]
    fn test_autoscaling_tags_propagate() {
        let tags = standard_tags("fleet_a", "fleet_a");
        let built = autoscaling_tags("CreateAutoScalingGroup", &tags).unwrap();
        assert_eq!(built.len(), tags.len());
        assert!(built.iter().all(|t| t.propagate_at_launch() == Some(true)));
    }
}
