//! A cache that stores nothing.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use lapse_core::{CacheError, CacheResult, Entry, EvictionCallback, Expiration, Numeric, Timestamp};

use crate::traits::{Cacher, NumericCacher};

/// Drop-in [`Cacher`] that discards every write.
///
/// Reads always miss, `add` and `replace` always succeed, and the numeric
/// operations always report the key as missing. Useful for switching caching
/// off without changing call sites.
pub struct NoopCache<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> NoopCache<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for NoopCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for NoopCache<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for NoopCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NoopCache")
    }
}

impl<T> Cacher<T> for NoopCache<T> {
    fn set(&self, _key: &str, _value: T, _expiration: Expiration) {}

    fn set_default(&self, _key: &str, _value: T) {}

    fn add(&self, _key: &str, _value: T, _expiration: Expiration) -> CacheResult<()> {
        Ok(())
    }

    fn replace(&self, _key: &str, _value: T, _expiration: Expiration) -> CacheResult<()> {
        Ok(())
    }

    fn get(&self, _key: &str) -> Option<T> {
        None
    }

    fn get_with_expiration(&self, _key: &str) -> Option<(T, Option<Timestamp>)> {
        None
    }

    fn delete(&self, _key: &str) {}

    fn delete_expired(&self) -> usize {
        0
    }

    fn items(&self) -> HashMap<String, Entry<T>> {
        HashMap::new()
    }

    fn item_count(&self) -> usize {
        0
    }

    fn flush(&self) {}

    fn on_evicted(&self, _callback: Option<EvictionCallback<T>>) {}
}

impl<T: Numeric> NumericCacher<T> for NoopCache<T> {
    fn increment(&self, key: &str, _delta: T) -> CacheResult<T> {
        Err(CacheError::key_not_found(key))
    }

    fn decrement(&self, key: &str, _delta: T) -> CacheResult<T> {
        Err(CacheError::key_not_found(key))
    }
}
