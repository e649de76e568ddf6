//! Expiration sentinels for write operations.
//!
//! Every write takes an [`Expiration`] instead of a raw duration so the two
//! sentinel meanings ("use the default", "never") cannot be confused with a
//! real time span.

use crate::constants::{DEFAULT_EXPIRATION_SENTINEL_MS, NO_EXPIRATION_SENTINEL_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a written entry should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Expiration {
    /// Use the store's default TTL (sentinel `0`).
    #[default]
    Default,
    /// The entry never expires (sentinel `-1`).
    Never,
    /// The entry expires this long after the write.
    After(Duration),
}

impl Expiration {
    /// Expire after the given duration.
    pub fn after(duration: Duration) -> Self {
        Self::After(duration)
    }

    /// Expire after the given number of milliseconds.
    pub fn after_millis(millis: u64) -> Self {
        Self::After(Duration::from_millis(millis))
    }

    /// Expire after the given number of seconds.
    pub fn after_secs(secs: u64) -> Self {
        Self::After(Duration::from_secs(secs))
    }

    /// Interpret a signed millisecond count the way the sentinel API does:
    /// `0` means default, any negative value means never.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            DEFAULT_EXPIRATION_SENTINEL_MS => Self::Default,
            m if m <= NO_EXPIRATION_SENTINEL_MS => Self::Never,
            m => Self::After(Duration::from_millis(m as u64)),
        }
    }

    /// Signed millisecond form, the inverse of [`Expiration::from_millis`].
    pub fn as_millis(&self) -> i64 {
        match self {
            Self::Default => DEFAULT_EXPIRATION_SENTINEL_MS,
            Self::Never => NO_EXPIRATION_SENTINEL_MS,
            Self::After(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Resolve against a store default into a concrete TTL.
    ///
    /// Returns `None` when the entry should never expire. A zero `After`
    /// behaves like `Default`.
    pub fn resolve(&self, default_ttl: Option<Duration>) -> Option<Duration> {
        match self {
            Self::Default => default_ttl,
            Self::Never => None,
            Self::After(d) if d.is_zero() => default_ttl,
            Self::After(d) => Some(*d),
        }
    }

    /// Resolve a construction-time default. Both sentinels mean "no default
    /// expiration", so a store built with `Default` never expires entries
    /// unless a write asks for it.
    pub fn as_default_ttl(&self) -> Option<Duration> {
        self.resolve(None)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

impl From<Duration> for Expiration {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Self::Default
        } else {
            Self::After(duration)
        }
    }
}

impl From<Option<Duration>> for Expiration {
    fn from(duration: Option<Duration>) -> Self {
        match duration {
            Some(d) => Self::from(d),
            None => Self::Never,
        }
    }
}
