//! Cache entry representation.

use crate::Timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored value and the absolute instant after which it is considered gone.
///
/// The expiration is fixed when the entry is written and only changes when
/// the key is written again. `None` means the entry never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub value: T,
    pub expiration: Option<Timestamp>,
}

impl<T> Entry<T> {
    /// Create an entry with an explicit expiration instant.
    pub fn new(value: T, expiration: Option<Timestamp>) -> Self {
        Self { value, expiration }
    }

    /// Create an entry that never expires.
    pub fn persistent(value: T) -> Self {
        Self {
            value,
            expiration: None,
        }
    }

    /// Create an entry expiring `ttl` from `now`. `None` never expires.
    ///
    /// A TTL reaching past the last representable instant is clamped to
    /// `DateTime::<Utc>::MAX_UTC`, so the entry still carries an expiration.
    pub fn with_ttl(value: T, ttl: Option<Duration>, now: Timestamp) -> Self {
        let expiration = ttl.map(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Self { value, expiration }
    }

    /// Check whether the entry has expired relative to `now`.
    ///
    /// An entry is still live at exactly its expiration instant.
    #[inline]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.expiration {
            Some(at) => now > at,
            None => false,
        }
    }

    /// Check whether the entry has expired as of the current wall clock.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before the entry expires, or `None` if it never does.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.expiration.map(|at| {
            at.signed_duration_since(Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
