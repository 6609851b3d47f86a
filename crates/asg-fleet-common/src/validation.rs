//! Naming constraints for fleet artifacts
//!
//! Each artifact kind has its own rules on the AWS side. Names are checked
//! before any API call so a bad group name fails the run with nothing to
//! clean up.
//!
//! | Role | Length | Characters | Extra |
//! |------|--------|------------|-------|
//! | target group, load balancer | 3–32 | `A-Za-z0-9-` | no leading/trailing `-`, no `internal` prefix |
//! | image | 3–128 | `A-Za-z0-9()[] ./-'@_` | |
//! | launch template | 3–128 | `A-Za-z0-9()./-_` | |
//! | auto scaling group | 1–255 | any non-control character | |

use crate::names::DerivedNames;
use std::fmt;
use thiserror::Error;

/// The artifact a name is destined for; selects the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameRole {
    Image,
    LaunchTemplate,
    TargetGroup,
    LoadBalancer,
    AutoScalingGroup,
}

impl NameRole {
    pub fn as_str(self) -> &'static str {
        match self {
            NameRole::Image => "image",
            NameRole::LaunchTemplate => "launch template",
            NameRole::TargetGroup => "target group",
            NameRole::LoadBalancer => "load balancer",
            NameRole::AutoScalingGroup => "auto scaling group",
        }
    }

    fn rules(self) -> NameRules {
        match self {
            NameRole::TargetGroup | NameRole::LoadBalancer => ELB_RULES,
            NameRole::Image => IMAGE_RULES,
            NameRole::LaunchTemplate => LAUNCH_TEMPLATE_RULES,
            NameRole::AutoScalingGroup => AUTO_SCALING_GROUP_RULES,
        }
    }
}

impl fmt::Display for NameRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct NameRules {
    min_len: usize,
    max_len: usize,
    allowed: fn(char) -> bool,
    charset: &'static str,
    forbid_edge_hyphen: bool,
    reserved_prefix: Option<&'static str>,
}

fn is_elb_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_image_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "()[] ./-'@_".contains(c)
}

fn is_launch_template_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "()./-_".contains(c)
}

fn is_printable(c: char) -> bool {
    !c.is_control()
}

const ELB_RULES: NameRules = NameRules {
    min_len: 3,
    max_len: 32,
    allowed: is_elb_char,
    charset: "alphanumeric characters or hyphens",
    forbid_edge_hyphen: true,
    reserved_prefix: Some("internal"),
};

const IMAGE_RULES: NameRules = NameRules {
    min_len: 3,
    max_len: 128,
    allowed: is_image_char,
    charset: "alphanumeric characters, spaces or ()[]./-'@_",
    forbid_edge_hyphen: false,
    reserved_prefix: None,
};

const LAUNCH_TEMPLATE_RULES: NameRules = NameRules {
    min_len: 3,
    max_len: 128,
    allowed: is_launch_template_char,
    charset: "alphanumeric characters or ()./-_",
    forbid_edge_hyphen: false,
    reserved_prefix: None,
};

const AUTO_SCALING_GROUP_RULES: NameRules = NameRules {
    min_len: 1,
    max_len: 255,
    allowed: is_printable,
    charset: "non-control characters",
    forbid_edge_hyphen: false,
    reserved_prefix: None,
};

/// A derived name violates the rules of its role
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{role} name will be {name:?}, it shouldn't contain less than {min} symbols, but contains {len}")]
    TooShort {
        role: NameRole,
        name: String,
        min: usize,
        len: usize,
    },

    #[error("{role} name will be {name:?}, it shouldn't contain more than {max} symbols, but contains {len}")]
    TooLong {
        role: NameRole,
        name: String,
        max: usize,
        len: usize,
    },

    #[error("{role} name will be {name:?}, it must contain only {charset} (found {found:?})")]
    InvalidCharacter {
        role: NameRole,
        name: String,
        charset: &'static str,
        found: char,
    },

    #[error("{role} name will be {name:?}, it must not begin or end with a hyphen")]
    HyphenAtEdge { role: NameRole, name: String },

    #[error("{role} name will be {name:?}, it must not begin with {prefix:?}")]
    ReservedPrefix {
        role: NameRole,
        name: String,
        prefix: &'static str,
    },
}

impl ValidationError {
    pub fn role(&self) -> NameRole {
        match self {
            ValidationError::TooShort { role, .. }
            | ValidationError::TooLong { role, .. }
            | ValidationError::InvalidCharacter { role, .. }
            | ValidationError::HyphenAtEdge { role, .. }
            | ValidationError::ReservedPrefix { role, .. } => *role,
        }
    }
}

/// Check a single name against the rules of `role`.
pub fn validate(name: &str, role: NameRole) -> Result<(), ValidationError> {
    let rules = role.rules();
    let len = name.chars().count();

    if len < rules.min_len {
        return Err(ValidationError::TooShort {
            role,
            name: name.to_string(),
            min: rules.min_len,
            len,
        });
    }
    if len > rules.max_len {
        return Err(ValidationError::TooLong {
            role,
            name: name.to_string(),
            max: rules.max_len,
            len,
        });
    }
    if let Some(found) = name.chars().find(|c| !(rules.allowed)(*c)) {
        return Err(ValidationError::InvalidCharacter {
            role,
            name: name.to_string(),
            charset: rules.charset,
            found,
        });
    }
    if rules.forbid_edge_hyphen && (name.starts_with('-') || name.ends_with('-')) {
        return Err(ValidationError::HyphenAtEdge {
            role,
            name: name.to_string(),
        });
    }
    if let Some(prefix) = rules.reserved_prefix {
        if name.starts_with(prefix) {
            return Err(ValidationError::ReservedPrefix {
                role,
                name: name.to_string(),
                prefix,
            });
        }
    }
    Ok(())
}

/// Check every derived name with its own role. Stops at the first violation.
pub fn validate_all(names: &DerivedNames) -> Result<(), ValidationError> {
    validate(&names.load_balancer, NameRole::LoadBalancer)?;
    validate(&names.target_group, NameRole::TargetGroup)?;
    validate(&names.image, NameRole::Image)?;
    validate(&names.launch_template, NameRole::LaunchTemplate)?;
    validate(&names.auto_scaling_group, NameRole::AutoScalingGroup)?;
    Ok(())
}
