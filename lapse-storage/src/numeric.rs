//! In-place increment and decrement for numeric stores.

use lapse_core::{CacheResult, Numeric};

use crate::observer::StoreOp;
use crate::store::Store;

impl<T> Store<T>
where
    T: Numeric,
{
    /// Add `delta` to the live value at `key` and return the new value.
    ///
    /// Integers wrap on overflow. The entry keeps its expiration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`](lapse_core::CacheError::KeyNotFound)
    /// if the key is absent or expired.
    pub fn increment(&self, key: &str, delta: T) -> CacheResult<T> {
        self.update_live(StoreOp::Increment, key, |current| current.numeric_add(delta))
    }

    /// Subtract `delta` from the live value at `key` and return the new value.
    ///
    /// Integers wrap on underflow, so decrementing an unsigned zero yields the
    /// type's maximum.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`](lapse_core::CacheError::KeyNotFound)
    /// if the key is absent or expired.
    pub fn decrement(&self, key: &str, delta: T) -> CacheResult<T> {
        self.update_live(StoreOp::Decrement, key, |current| current.numeric_sub(delta))
    }
}
