//! Error types for LAPSE operations

use thiserror::Error;

/// Errors surfaced by cache operations.
///
/// Only the conditional writes (`add`, `replace`) and the numeric mutators
/// (`increment`, `decrement`) fail during normal store use. The remaining
/// variants come from the snapshot helpers, metrics registration and
/// configuration loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Item {key} already exists")]
    KeyExists { key: String },

    #[error("Item {key} not found")]
    KeyNotFound { key: String },

    #[error("Snapshot encoding failed: {reason}")]
    Snapshot { reason: String },

    #[error("Snapshot I/O failed: {reason}")]
    Io { reason: String },

    #[error("Metrics registration failed: {reason}")]
    Metrics { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    Config {
        field: String,
        value: String,
        reason: String,
    },
}

impl CacheError {
    pub fn key_exists(key: impl Into<String>) -> Self {
        Self::KeyExists { key: key.into() }
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Returns true for the two key-state errors a caller can recover from
    /// by retrying or falling back to an unconditional set.
    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::KeyExists { .. } | Self::KeyNotFound { .. })
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for LAPSE operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================
