//! LAPSE Storage - Expiring Store, Janitor and Cache Handle
//!
//! The concurrency-safe part of LAPSE:
//! - [`Store`]: string-keyed map of expiring entries behind one `RwLock`
//! - increment/decrement for numeric stores
//! - eviction callbacks, always run after the lock is released
//! - [`Janitor`]: periodic sweep of expired entries
//! - [`Cache`]: shared handle whose last drop stops the janitor
//! - [`Cacher`] / [`NumericCacher`] traits, with [`NoopCache`] as a stand-in
//! - observers ([`StatsObserver`], [`PrometheusObserver`]) and JSON snapshots
//!
//! # Example
//!
//! ```
//! use lapse_core::Expiration;
//! use lapse_storage::Cache;
//! use std::time::Duration;
//!
//! let cache: Cache<String> = Cache::new(Expiration::after_secs(300), Duration::ZERO);
//! cache.set("greeting", "hello".to_string(), Expiration::Default);
//! assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
//! ```

mod eviction;
pub mod handle;
pub mod janitor;
pub mod metrics;
pub mod noop;
mod numeric;
pub mod observer;
pub mod snapshot;
pub mod store;
pub mod traits;

pub use handle::{Cache, CacheBuilder};
pub use janitor::Janitor;
pub use metrics::PrometheusObserver;
pub use noop::NoopCache;
pub use observer::{NoopObserver, StatsObserver, StoreEvent, StoreObserver, StoreOp, StoreStats};
pub use snapshot::Snapshot;
pub use store::Store;
pub use traits::{Cacher, NumericCacher};

pub use lapse_core::{
    CacheConfig, CacheError, CacheResult, Entry, EvictionCallback, Expiration, Numeric, Timestamp,
};
