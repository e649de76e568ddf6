//! The user-facing cache handle.
//!
//! [`Cache`] bundles a [`Store`] with its [`Janitor`]. Clones share both.
//! When the last clone is dropped the janitor is told to stop, even though
//! its sweep loop still holds the store.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use lapse_core::{
    CacheConfig, CacheResult, Entry, EvictionCallback, Expiration, Numeric, Timestamp,
};

use crate::janitor::Janitor;
use crate::observer::StoreObserver;
use crate::store::Store;

struct CacheInner<T> {
    store: Arc<Store<T>>,
    janitor: Option<Janitor>,
}

impl<T> Drop for CacheInner<T> {
    fn drop(&mut self) {
        if let Some(janitor) = &self.janitor {
            janitor.stop();
        }
    }
}

/// Shared handle to an expiring store with optional background sweeping.
///
/// Dereferences to [`Store`], so every store operation is available directly
/// on the handle.
///
/// Leaking a handle (for example with `std::mem::forget`) leaks its janitor
/// as well.
///
/// # Example
///
/// ```
/// use lapse_core::Expiration;
/// use lapse_storage::Cache;
/// use std::time::Duration;
///
/// let cache: Cache<i64> = Cache::new(Expiration::after_secs(300), Duration::ZERO);
/// cache.set("hits", 1, Expiration::Default);
/// assert_eq!(cache.increment("hits", 41), Ok(42));
/// ```
pub struct Cache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache. A zero `cleanup_interval` disables the janitor.
    pub fn new(default_expiration: impl Into<Expiration>, cleanup_interval: Duration) -> Self {
        Self::builder()
            .default_expiration(default_expiration)
            .cleanup_interval(cleanup_interval)
            .build()
    }

    /// Create a cache from a [`CacheConfig`].
    pub fn with_config(config: CacheConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Create a cache seeded with `items`, e.g. a map previously returned by
    /// [`Store::items`].
    pub fn from_items(config: CacheConfig, items: HashMap<String, Entry<T>>) -> Self {
        Self::builder().config(config).items(items).build()
    }

    pub fn builder() -> CacheBuilder<T> {
        CacheBuilder::new()
    }

    /// The shared store. Useful for handing out store access that must not
    /// keep the janitor alive.
    pub fn store(&self) -> Arc<Store<T>> {
        Arc::clone(&self.inner.store)
    }

    /// Stop the janitor now rather than when the last handle drops.
    /// Idempotent; the store stays usable, it just stops being swept.
    pub fn close(&self) {
        if let Some(janitor) = &self.inner.janitor {
            janitor.stop();
        }
    }

    /// Whether a janitor was started and has not yet exited.
    pub fn janitor_running(&self) -> bool {
        self.inner
            .janitor
            .as_ref()
            .is_some_and(|janitor| janitor.is_running())
    }

    /// The sweep interval, `None` if no janitor was started.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.inner.janitor.as_ref().map(Janitor::interval)
    }
}

// Inherent forwarders for every operation the cache traits also define.
// Method lookup reaches `&Cache<T>` before it derefs to `Store<T>`, so
// without these an imported `Cacher` would shadow the store's signatures.
impl<T> Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn set(&self, key: impl Into<String>, value: T, expiration: Expiration) {
        self.inner.store.set(key, value, expiration)
    }

    pub fn set_default(&self, key: impl Into<String>, value: T) {
        self.inner.store.set_default(key, value)
    }

    pub fn add(&self, key: impl Into<String>, value: T, expiration: Expiration) -> CacheResult<()> {
        self.inner.store.add(key, value, expiration)
    }

    pub fn replace(
        &self,
        key: impl Into<String>,
        value: T,
        expiration: Expiration,
    ) -> CacheResult<()> {
        self.inner.store.replace(key, value, expiration)
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.store.get(key)
    }

    pub fn get_with_expiration(&self, key: &str) -> Option<(T, Option<Timestamp>)> {
        self.inner.store.get_with_expiration(key)
    }

    pub fn delete(&self, key: &str) {
        self.inner.store.delete(key)
    }

    pub fn delete_expired(&self) -> usize {
        self.inner.store.delete_expired()
    }

    pub fn items(&self) -> HashMap<String, Entry<T>> {
        self.inner.store.items()
    }

    pub fn item_count(&self) -> usize {
        self.inner.store.item_count()
    }

    pub fn flush(&self) {
        self.inner.store.flush()
    }

    pub fn on_evicted(&self, callback: Option<EvictionCallback<T>>) {
        self.inner.store.on_evicted(callback)
    }
}

impl<T> Cache<T>
where
    T: Numeric,
{
    pub fn increment(&self, key: &str, delta: T) -> CacheResult<T> {
        self.inner.store.increment(key, delta)
    }

    pub fn decrement(&self, key: &str, delta: T) -> CacheResult<T> {
        self.inner.store.decrement(key, delta)
    }
}

impl<T> Deref for Cache<T> {
    type Target = Store<T>;

    fn deref(&self) -> &Store<T> {
        &self.inner.store
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("store", &self.inner.store)
            .field("janitor", &self.inner.janitor)
            .finish()
    }
}

impl<T> Default for Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`Cache`].
pub struct CacheBuilder<T> {
    config: CacheConfig,
    items: HashMap<String, Entry<T>>,
    observer: Option<Arc<dyn StoreObserver>>,
    on_evicted: Option<EvictionCallback<T>>,
}

impl<T> CacheBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            items: HashMap::new(),
            observer: None,
            on_evicted: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_expiration(mut self, expiration: impl Into<Expiration>) -> Self {
        self.config = self.config.with_default_expiration(expiration);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_cleanup_interval(interval);
        self
    }

    /// Initial contents, taken over as-is.
    pub fn items(mut self, items: HashMap<String, Entry<T>>) -> Self {
        self.items = items;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Eviction callback installed before the janitor starts, so no sweep
    /// can run without it.
    pub fn on_evicted<F>(mut self, f: F) -> Self
    where
        F: Fn(String, T) + Send + Sync + 'static,
    {
        self.on_evicted = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Cache<T> {
        let mut store = Store::from_items(self.config.default_expiration, self.items);
        if let Some(observer) = self.observer {
            store = store.with_observer(observer);
        }
        if self.on_evicted.is_some() {
            store.on_evicted(self.on_evicted);
        }

        let store = Arc::new(store);
        let janitor = Janitor::start(Arc::clone(&store), self.config.cleanup_interval);

        tracing::debug!(
            default_ttl_ms = self.config.default_ttl().map(|ttl| ttl.as_millis() as u64),
            janitor = janitor.is_some(),
            "Cache created"
        );

        Cache {
            inner: Arc::new(CacheInner { store, janitor }),
        }
    }
}

impl<T> Default for CacheBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
