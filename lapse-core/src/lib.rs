//! LAPSE Core - Entry and Expiration Types
//!
//! Plain data types shared by every LAPSE crate: the stored [`Entry`], the
//! [`Expiration`] sentinels accepted by writes, the [`Numeric`] kinds that
//! support increment/decrement, configuration and errors.
//! This crate contains no locking and no background work.

use chrono::{DateTime, Utc};

pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod expiration;
pub mod numeric;

pub use config::CacheConfig;
pub use entry::Entry;
pub use error::{CacheError, CacheResult};
pub use expiration::Expiration;
pub use numeric::Numeric;

/// Absolute instant type used for entry expirations.
pub type Timestamp = DateTime<Utc>;

/// Eviction callback invoked with the key and the removed value.
///
/// Stored behind an `Arc` so it can be cloned out of the store's lock and
/// called after the lock is released.
pub type EvictionCallback<T> = std::sync::Arc<dyn Fn(String, T) + Send + Sync + 'static>;
