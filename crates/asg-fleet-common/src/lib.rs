//! asg-fleet-common - Shared types and utilities
//!
//! This crate holds everything that does not need the AWS SDK: artifact
//! naming, the platform's naming rules, defaults and duration parsing.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`duration`]: Go-style duration string parsing (`1m30s`)
//! - [`names`]: Derivation of artifact names from the group name
//! - [`resource_kind`]: Fleet resource kinds and their rollback order
//! - [`tags`]: AWS resource tag constants
//! - [`validation`]: Per-role naming constraints

pub mod defaults;
pub mod duration;
pub mod names;
pub mod resource_kind;
pub mod tags;
pub mod validation;

// Re-export commonly used types
pub use duration::{DurationParseError, parse_duration};
pub use names::{DerivedNames, derive_names};
pub use resource_kind::ResourceKind;
pub use validation::{NameRole, ValidationError, validate, validate_all};
