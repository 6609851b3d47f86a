//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format, and the error type every
//! [`ControlPlane`](super::ControlPlane) operation returns.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories for retry and rollback logic
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (safe to skip in rollback)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Resource with the same name already exists
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Resource is still referenced by another one (retryable during deletes)
    #[error("Resource in use: {message}")]
    DependencyViolation { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled | AwsError::DependencyViolation { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// Classify any SDK operation error through its error metadata.
    pub fn from_sdk<E>(err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let code = err.code().map(str::to_string);
        let message = match err.message() {
            Some(m) => m.to_string(),
            None => DisplayErrorContext(&err).to_string(),
        };
        classify_aws_error(code.as_deref(), Some(&message))
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidAMIID.NotFound",
    "InvalidAMIID.Unavailable",
    "InvalidInstanceID.NotFound",
    "InvalidLaunchTemplateId.NotFound",
    "InvalidLaunchTemplateName.NotFoundException",
    "InvalidVpcID.NotFound",
    "InvalidSubnetID.NotFound",
    "InvalidSnapshot.NotFound",
    "TargetGroupNotFound",
    "LoadBalancerNotFound",
    "ListenerNotFound",
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "InvalidAMIName.Duplicate",
    "InvalidLaunchTemplateName.AlreadyExistsException",
    "DuplicateTargetGroupName",
    "DuplicateLoadBalancerName",
    "DuplicateListener",
    "AlreadyExists",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for resources still referenced elsewhere
const DEPENDENCY_CODES: &[&str] = &[
    "DependencyViolation",
    "ResourceInUse",
    "ScalingActivityInProgress",
    "InvalidSnapshot.InUse",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if DEPENDENCY_CODES.contains(&c) => AwsError::DependencyViolation { message },
        // Auto Scaling reports unknown groups as a generic validation error
        Some("ValidationError") if message.contains("not found") => AwsError::NotFound { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Error returned by every control plane operation
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The API call itself failed (network, throttling, service error)
    #[error("{operation} failed")]
    Call {
        operation: &'static str,
        #[source]
        source: AwsError,
    },

    /// A response held other than exactly one matching resource
    #[error("{operation} returned {count} {resource}s for {id}, expected exactly one")]
    Cardinality {
        operation: &'static str,
        resource: &'static str,
        id: String,
        count: usize,
    },

    /// A request could not be assembled from its parts
    #[error("could not build {operation} request")]
    InvalidRequest {
        operation: &'static str,
        #[source]
        source: aws_sdk_elasticloadbalancingv2::error::BuildError,
    },

    /// A response lacked a field the caller relies on
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl ControlPlaneError {
    pub fn call(operation: &'static str, source: AwsError) -> Self {
        ControlPlaneError::Call { operation, source }
    }

    pub fn invalid_request(
        operation: &'static str,
        source: aws_sdk_elasticloadbalancingv2::error::BuildError,
    ) -> Self {
        ControlPlaneError::InvalidRequest { operation, source }
    }

    /// Classify an SDK error and attach the operation name.
    pub fn sdk<E>(operation: &'static str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        Self::call(operation, AwsError::from_sdk(err))
    }

    /// Call failures may clear up on the next attempt; malformed or
    /// ambiguous responses will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlPlaneError::Call { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ControlPlaneError::Call { source, .. } if source.is_not_found())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ControlPlaneError::Call { source, .. } if source.is_retryable())
    }
}

/// Take the only element of `items`, or report how many there were.
pub fn exactly_one<T>(
    items: impl IntoIterator<Item = T>,
    operation: &'static str,
    resource: &'static str,
    id: &str,
) -> Result<T, ControlPlaneError> {
    let mut items: Vec<T> = items.into_iter().collect();
    if items.len() != 1 {
        return Err(ControlPlaneError::Cardinality {
            operation,
            resource,
            id: id.to_string(),
            count: items.len(),
        });
    }
    Ok(items.remove(0))
}

/// Convert "not found" results to `Ok(None)` for idempotent deletes.
pub fn ignore_not_found<T>(result: Result<T, ControlPlaneError>) -> Result<Option<T>, ControlPlaneError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
