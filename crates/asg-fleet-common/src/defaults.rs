//! Default configuration values
//!
//! These constants back the CLI defaults and keep tests and the binary in
//! agreement.

/// Default health-check HTTP path
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Default HTTP traffic and health-check port
pub const DEFAULT_PORT: u16 = 80;

/// Default number of fleet members
pub const DEFAULT_INSTANCES: u32 = 1;

/// Default time a new instance gets to become healthy
pub const DEFAULT_HEALTH_CHECK_GRACE_PERIOD: &str = "1m";

/// Default per-stage poll timeout
pub const DEFAULT_UPDATE_TIMEOUT: &str = "30m";

/// Default interval between poll attempts
pub const DEFAULT_UPDATE_TICK: &str = "1m";

/// Suffix appended to the group name to name the image
pub const IMAGE_NAME_SUFFIX: &str = " v1";

/// Launch template market type; fleet members always run on spot capacity
pub const MARKET_TYPE: &str = "spot";

/// Health-check type the auto-scaling group uses (routing target health)
pub const GROUP_HEALTH_CHECK_TYPE: &str = "ELB";

/// Granularity for auto-scaling group metrics collection
pub const METRICS_GRANULARITY: &str = "1Minute";

/// Maximum fleet size is this multiple of the desired size
pub const MAX_SIZE_FACTOR: u32 = 2;
