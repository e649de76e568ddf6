//! The expiring key-value store.
//!
//! One `RwLock` guards the entry map and the eviction callback slot. Reads
//! (`get`, `get_with_expiration`, `items`, `item_count`) take the shared
//! lock; everything that mutates takes the exclusive lock for its whole
//! check-then-write sequence. Eviction callbacks and observer notifications
//! always run after the guard is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use lapse_core::{CacheError, CacheResult, Entry, EvictionCallback, Expiration, Timestamp};

use crate::eviction::Evictions;
use crate::observer::{NoopObserver, StoreEvent, StoreObserver, StoreOp};

/// Everything behind the store's lock.
pub(crate) struct StoreState<T> {
    items: HashMap<String, Entry<T>>,
    on_evicted: Option<EvictionCallback<T>>,
}

impl<T> StoreState<T> {
    /// The entry for `key` if it exists and has not expired.
    fn live(&self, key: &str, now: Timestamp) -> Option<&Entry<T>> {
        self.items.get(key).filter(|entry| !entry.is_expired_at(now))
    }
}

/// Thread-safe map from string keys to expiring entries.
///
/// Expired entries are hidden from reads immediately (lazy expiration) but
/// stay in the map until [`Store::delete_expired`] runs, either explicitly
/// or from a [`Janitor`](crate::Janitor).
///
/// # Example
///
/// ```
/// use lapse_core::Expiration;
/// use lapse_storage::Store;
/// use std::time::Duration;
///
/// let store: Store<String> = Store::new(Expiration::after_secs(300));
/// store.set("user:123", "John Doe".to_string(), Expiration::Default);
/// assert_eq!(store.get("user:123").as_deref(), Some("John Doe"));
///
/// store.add("user:123", "Jane".to_string(), Expiration::Default).unwrap_err();
/// store.delete("user:123");
/// assert!(store.get("user:123").is_none());
/// ```
pub struct Store<T> {
    state: RwLock<StoreState<T>>,
    default_ttl: Option<Duration>,
    observer: Arc<dyn StoreObserver>,
}

impl<T> Store<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty store.
    ///
    /// `default_expiration` is the TTL applied to writes passing
    /// [`Expiration::Default`]. Both sentinels mean "never expire by default".
    pub fn new(default_expiration: impl Into<Expiration>) -> Self {
        Self::from_items(default_expiration, HashMap::new())
    }

    /// Create a store seeded with an existing entry map, typically one
    /// produced by [`Store::items`] and deserialized elsewhere.
    ///
    /// The map is taken over as-is, expired entries included.
    pub fn from_items(
        default_expiration: impl Into<Expiration>,
        items: HashMap<String, Entry<T>>,
    ) -> Self {
        Self {
            state: RwLock::new(StoreState {
                items,
                on_evicted: None,
            }),
            default_ttl: default_expiration.into().as_default_ttl(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observer notified after every operation.
    pub fn with_observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The TTL used for [`Expiration::Default`] writes, `None` if never.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub(crate) fn observer(&self) -> &Arc<dyn StoreObserver> {
        &self.observer
    }

    // A panic while holding the lock cannot leave the map half-written (every
    // mutation is a single insert/remove/swap), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, StoreState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn observe(&self, event: StoreEvent) {
        self.observer.record(&event);
    }

    fn entry_for(&self, value: T, expiration: Expiration, now: Timestamp) -> Entry<T> {
        Entry::with_ttl(value, expiration.resolve(self.default_ttl), now)
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Insert or overwrite `key`. Overwriting is not an eviction, so no
    /// callback fires.
    pub fn set(&self, key: impl Into<String>, value: T, expiration: Expiration) {
        let entry = self.entry_for(value, expiration, Utc::now());
        let (previous, item_count) = {
            let mut state = self.write();
            let previous = state.items.insert(key.into(), entry);
            (previous, state.items.len())
        };
        drop(previous);
        self.observe(StoreEvent::new(StoreOp::Set, true, item_count));
    }

    /// Insert or overwrite `key` using the default expiration.
    pub fn set_default(&self, key: impl Into<String>, value: T) {
        self.set(key, value, Expiration::Default);
    }

    /// Insert `key` only if no live entry exists for it.
    ///
    /// An expired entry that has not been swept yet counts as absent and is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyExists`] if a live entry is present. The
    /// store is left untouched.
    pub fn add(&self, key: impl Into<String>, value: T, expiration: Expiration) -> CacheResult<()> {
        let key = key.into();
        let now = Utc::now();
        let entry = self.entry_for(value, expiration, now);

        let mut state = self.write();
        if state.live(&key, now).is_some() {
            let item_count = state.items.len();
            drop(state);
            self.observe(StoreEvent::new(StoreOp::Add, false, item_count));
            return Err(CacheError::key_exists(key));
        }
        let previous = state.items.insert(key, entry);
        let item_count = state.items.len();
        drop(state);
        drop(previous);

        self.observe(StoreEvent::new(StoreOp::Add, true, item_count));
        Ok(())
    }

    /// Overwrite `key` only if a live entry exists for it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if the key is absent or expired.
    /// The store is left untouched.
    pub fn replace(
        &self,
        key: impl Into<String>,
        value: T,
        expiration: Expiration,
    ) -> CacheResult<()> {
        let key = key.into();
        let now = Utc::now();
        let entry = self.entry_for(value, expiration, now);

        let mut state = self.write();
        if state.live(&key, now).is_none() {
            let item_count = state.items.len();
            drop(state);
            self.observe(StoreEvent::new(StoreOp::Replace, false, item_count));
            return Err(CacheError::key_not_found(key));
        }
        let previous = state.items.insert(key, entry);
        let item_count = state.items.len();
        drop(state);
        drop(previous);

        self.observe(StoreEvent::new(StoreOp::Replace, true, item_count));
        Ok(())
    }

    /// Read-modify-write a live entry under one exclusive lock acquisition,
    /// keeping its expiration. Used by increment and decrement.
    pub(crate) fn update_live<F>(&self, op: StoreOp, key: &str, update: F) -> CacheResult<T>
    where
        F: FnOnce(&T) -> T,
    {
        let now = Utc::now();
        let mut state = self.write();
        let item_count = state.items.len();

        let updated = match state.items.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.value = update(&entry.value);
                Some(entry.value.clone())
            }
            _ => None,
        };
        drop(state);

        self.observe(StoreEvent::new(op, updated.is_some(), item_count));
        updated.ok_or_else(|| CacheError::key_not_found(key))
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Get a copy of the value for `key`, or `None` if absent or expired.
    ///
    /// An expired entry is hidden but not removed.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Utc::now();
        let (value, item_count) = {
            let state = self.read();
            let value = state.live(key, now).map(|entry| entry.value.clone());
            (value, state.items.len())
        };
        self.observe(StoreEvent::new(StoreOp::Get, value.is_some(), item_count));
        value
    }

    /// Like [`Store::get`], also returning the absolute expiration instant
    /// (`None` when the entry never expires).
    pub fn get_with_expiration(&self, key: &str) -> Option<(T, Option<Timestamp>)> {
        let now = Utc::now();
        let (found, item_count) = {
            let state = self.read();
            let found = state
                .live(key, now)
                .map(|entry| (entry.value.clone(), entry.expiration));
            (found, state.items.len())
        };
        self.observe(StoreEvent::new(StoreOp::Get, found.is_some(), item_count));
        found
    }

    /// Copy of every unexpired entry as of this call.
    pub fn items(&self) -> HashMap<String, Entry<T>> {
        let now = Utc::now();
        let state = self.read();
        state
            .items
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Number of entries in the map, including expired ones not yet swept.
    pub fn item_count(&self) -> usize {
        self.read().items.len()
    }

    // ========================================================================
    // REMOVALS
    // ========================================================================

    /// Remove `key` and hand its value to the eviction callback. Does nothing
    /// if the key is absent.
    pub fn delete(&self, key: &str) {
        let (evictions, item_count) = {
            let mut state = self.write();
            let mut evictions = Evictions::new(state.on_evicted.clone());
            if let Some((key, entry)) = state.items.remove_entry(key) {
                evictions.push(key, entry.value);
            }
            (evictions, state.items.len())
        };

        let removed = evictions.count();
        self.observe(StoreEvent::new(StoreOp::Delete, removed > 0, item_count).with_removed(removed));
        evictions.dispatch();
    }

    /// Remove every expired entry, then fire the eviction callback once per
    /// removed entry. Returns how many entries were removed.
    pub fn delete_expired(&self) -> usize {
        let now = Utc::now();
        let (evictions, item_count) = {
            let mut state = self.write();
            let expired: Vec<String> = state
                .items
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();

            let mut evictions = Evictions::new(state.on_evicted.clone());
            for key in expired {
                if let Some((key, entry)) = state.items.remove_entry(&key) {
                    evictions.push(key, entry.value);
                }
            }
            (evictions, state.items.len())
        };

        let removed = evictions.count();
        self.observe(
            StoreEvent::new(StoreOp::DeleteExpired, true, item_count).with_removed(removed),
        );
        evictions.dispatch();
        removed
    }

    /// Drop every entry at once. Bulk clearing is not itemized eviction, so
    /// no callback fires.
    pub fn flush(&self) {
        let previous = {
            let mut state = self.write();
            std::mem::take(&mut state.items)
        };
        let flushed = previous.len();
        drop(previous);

        tracing::debug!(flushed, "Flushed cache entries");
        self.observe(StoreEvent::new(StoreOp::Flush, true, 0).with_removed(flushed));
    }

    /// Merge `items` into the store, skipping keys that already hold a live
    /// entry. Expired local entries are overwritten. Returns how many entries
    /// were taken from `items`.
    pub fn load_items(&self, items: HashMap<String, Entry<T>>) -> usize {
        let now = Utc::now();
        let (loaded, item_count) = {
            let mut state = self.write();
            let mut loaded = 0;
            for (key, entry) in items {
                if state.live(&key, now).is_none() {
                    state.items.insert(key, entry);
                    loaded += 1;
                }
            }
            (loaded, state.items.len())
        };

        tracing::trace!(loaded, "Loaded cache entries");
        self.observe(StoreEvent::new(StoreOp::Load, true, item_count));
        loaded
    }

    // ========================================================================
    // EVICTION CALLBACK
    // ========================================================================

    /// Install (`Some`) or clear (`None`) the eviction callback.
    ///
    /// The callback receives the key and removed value after every `delete`
    /// and for every entry removed by `delete_expired`. It is never called
    /// for overwrites or `flush`.
    pub fn on_evicted(&self, callback: Option<EvictionCallback<T>>) {
        self.write().on_evicted = callback;
    }

    /// Convenience for `on_evicted(Some(Arc::new(f)))`.
    pub fn set_on_evicted<F>(&self, f: F)
    where
        F: Fn(String, T) + Send + Sync + 'static,
    {
        self.on_evicted(Some(Arc::new(f)));
    }

    /// Convenience for `on_evicted(None)`.
    pub fn clear_on_evicted(&self) {
        self.on_evicted(None);
    }
}

impl<T> Default for Store<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(Expiration::Default)
    }
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Store")
            .field("item_count", &state.items.len())
            .field("default_ttl", &self.default_ttl)
            .field("has_eviction_callback", &state.on_evicted.is_some())
            .finish()
    }
}
