//! Constants for LAPSE
//!
//! Default values and environment variable names used by [`crate::CacheConfig`].

// ============================================================================
// EXPIRATION
// ============================================================================

/// Sentinel milliseconds value meaning "use the cache's default expiration".
pub const DEFAULT_EXPIRATION_SENTINEL_MS: i64 = 0;

/// Sentinel milliseconds value meaning "never expire".
pub const NO_EXPIRATION_SENTINEL_MS: i64 = -1;

// ============================================================================
// JANITOR
// ============================================================================

/// Default interval between janitor sweeps in seconds.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Name given to the dedicated janitor thread when no tokio runtime is
/// available at construction time.
pub const JANITOR_THREAD_NAME: &str = "lapse-janitor";

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Default expiration in milliseconds (`0` = library default, `-1` = never).
pub const ENV_DEFAULT_EXPIRATION_MS: &str = "LAPSE_DEFAULT_EXPIRATION_MS";

/// Janitor interval in milliseconds (`0` disables the janitor).
pub const ENV_CLEANUP_INTERVAL_MS: &str = "LAPSE_CLEANUP_INTERVAL_MS";
