//! Artifact name derivation
//!
//! Every artifact created for a fleet is named after the logical group name.
//! Elastic Load Balancing names do not allow underscores, so the target
//! group and the balancer use a hyphenated form.

use crate::defaults::IMAGE_NAME_SUFFIX;
use serde::Serialize;

/// Separator allowed in group names but rejected by Elastic Load Balancing
const ELB_DISALLOWED_SEPARATOR: char = '_';

/// Names of every artifact derived from one group name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DerivedNames {
    pub image: String,
    pub launch_template: String,
    pub target_group: String,
    pub load_balancer: String,
    pub auto_scaling_group: String,
}

/// Derive all artifact names from the logical group name.
pub fn derive_names(group_name: &str) -> DerivedNames {
    DerivedNames {
        image: image_name(group_name),
        launch_template: launch_template_name(group_name),
        target_group: target_group_name(group_name),
        load_balancer: load_balancer_name(group_name),
        auto_scaling_group: auto_scaling_group_name(group_name),
    }
}

pub fn image_name(group_name: &str) -> String {
    format!("{group_name}{IMAGE_NAME_SUFFIX}")
}

pub fn launch_template_name(group_name: &str) -> String {
    group_name.to_string()
}

pub fn target_group_name(group_name: &str) -> String {
    elb_name(group_name)
}

pub fn load_balancer_name(group_name: &str) -> String {
    elb_name(group_name)
}

pub fn auto_scaling_group_name(group_name: &str) -> String {
    group_name.to_string()
}

fn elb_name(group_name: &str) -> String {
    group_name.replace(ELB_DISALLOWED_SEPARATOR, "-")
}
