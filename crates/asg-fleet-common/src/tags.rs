//! AWS resource tag constants for asg-fleet
//!
//! Every taggable resource created for a fleet carries these tags so it can
//! be traced back to the run that created it.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `asg-fleet:tool` | Static identifier ("asg-fleet") |
//! | `asg-fleet:group` | Logical group name the fleet was created for |
//! | `asg-fleet:created-at` | RFC 3339 creation timestamp |
//! | `Name` | Derived artifact name |

/// Tag key for tool identification
pub const TAG_TOOL: &str = "asg-fleet:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "asg-fleet";

/// Tag key for the logical group name
pub const TAG_GROUP: &str = "asg-fleet:group";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "asg-fleet:created-at";

/// Conventional AWS display name tag
pub const TAG_NAME: &str = "Name";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Standard tags for a resource as key/value pairs.
pub fn standard_tags(group_name: &str, artifact_name: &str) -> Vec<(&'static str, String)> {
    vec![
        (TAG_TOOL, TAG_TOOL_VALUE.to_string()),
        (TAG_GROUP, group_name.to_string()),
        (TAG_CREATED_AT, format_created_at(chrono::Utc::now())),
        (TAG_NAME, artifact_name.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tags() {
        let tags = standard_tags("fleet_a", "fleet-a");
        assert_eq!(tags.len(), 4);
        assert!(tags.contains(&(TAG_TOOL, "asg-fleet".to_string())));
        assert!(tags.contains(&(TAG_GROUP, "fleet_a".to_string())));
        assert!(tags.contains(&(TAG_NAME, "fleet-a".to_string())));
    }

    #[test]
    fn test_created_at_is_rfc3339() {
        let tags = standard_tags("g", "n");
        let (_, created_at) = tags.iter().find(|(k, _)| *k == TAG_CREATED_AT).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    }
}
