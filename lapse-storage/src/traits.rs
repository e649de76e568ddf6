//! Object-safe cache traits.
//!
//! Code that only needs "some cache" can take `&dyn Cacher<T>` or
//! `Arc<dyn NumericCacher<T>>` and be handed a [`Store`], a [`Cache`] or a
//! [`NoopCache`](crate::NoopCache) to switch caching off.

use std::collections::HashMap;

use lapse_core::{CacheResult, Entry, EvictionCallback, Expiration, Numeric, Timestamp};

use crate::handle::Cache;
use crate::store::Store;

/// Every store operation, with borrowed keys so the trait stays object safe.
pub trait Cacher<T>: Send + Sync {
    /// Insert or overwrite `key`.
    fn set(&self, key: &str, value: T, expiration: Expiration);

    /// Insert or overwrite `key` with the default expiration.
    fn set_default(&self, key: &str, value: T);

    /// Insert only if `key` has no live entry.
    fn add(&self, key: &str, value: T, expiration: Expiration) -> CacheResult<()>;

    /// Overwrite only if `key` has a live entry.
    fn replace(&self, key: &str, value: T, expiration: Expiration) -> CacheResult<()>;

    fn get(&self, key: &str) -> Option<T>;

    fn get_with_expiration(&self, key: &str) -> Option<(T, Option<Timestamp>)>;

    /// Remove `key`, firing the eviction callback if it existed.
    fn delete(&self, key: &str);

    /// Remove all expired entries, returning how many were removed.
    fn delete_expired(&self) -> usize;

    /// Copy of all unexpired entries.
    fn items(&self) -> HashMap<String, Entry<T>>;

    /// Entry count, including expired entries not yet swept.
    fn item_count(&self) -> usize;

    /// Remove everything without firing callbacks.
    fn flush(&self);

    /// Install or clear the eviction callback.
    fn on_evicted(&self, callback: Option<EvictionCallback<T>>);
}

/// [`Cacher`] plus in-place arithmetic.
pub trait NumericCacher<T: Numeric>: Cacher<T> {
    fn increment(&self, key: &str, delta: T) -> CacheResult<T>;

    fn decrement(&self, key: &str, delta: T) -> CacheResult<T>;
}

// Bodies name the inherent `Store` operations explicitly.
macro_rules! impl_cacher_for_store_like {
    ($ty:ident) => {
        impl<T> Cacher<T> for $ty<T>
        where
            T: Clone + Send + Sync + 'static,
        {
            fn set(&self, key: &str, value: T, expiration: Expiration) {
                Store::<T>::set(self, key, value, expiration)
            }

            fn set_default(&self, key: &str, value: T) {
                Store::<T>::set_default(self, key, value)
            }

            fn add(&self, key: &str, value: T, expiration: Expiration) -> CacheResult<()> {
                Store::<T>::add(self, key, value, expiration)
            }

            fn replace(&self, key: &str, value: T, expiration: Expiration) -> CacheResult<()> {
                Store::<T>::replace(self, key, value, expiration)
            }

            fn get(&self, key: &str) -> Option<T> {
                Store::<T>::get(self, key)
            }

            fn get_with_expiration(&self, key: &str) -> Option<(T, Option<Timestamp>)> {
                Store::<T>::get_with_expiration(self, key)
            }

            fn delete(&self, key: &str) {
                Store::<T>::delete(self, key)
            }

            fn delete_expired(&self) -> usize {
                Store::<T>::delete_expired(self)
            }

            fn items(&self) -> HashMap<String, Entry<T>> {
                Store::<T>::items(self)
            }

            fn item_count(&self) -> usize {
                Store::<T>::item_count(self)
            }

            fn flush(&self) {
                Store::<T>::flush(self)
            }

            fn on_evicted(&self, callback: Option<EvictionCallback<T>>) {
                Store::<T>::on_evicted(self, callback)
            }
        }

        impl<T> NumericCacher<T> for $ty<T>
        where
            T: Numeric,
        {
            fn increment(&self, key: &str, delta: T) -> CacheResult<T> {
                Store::<T>::increment(self, key, delta)
            }

            fn decrement(&self, key: &str, delta: T) -> CacheResult<T> {
                Store::<T>::decrement(self, key, delta)
            }
        }
    };
}

// `Cache<T>` reaches these through `Deref<Target = Store<T>>`.
impl_cacher_for_store_like!(Store);
impl_cacher_for_store_like!(Cache);
