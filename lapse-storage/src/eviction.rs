//! Eviction callback dispatch.
//!
//! Removals are collected while the store's write lock is held and handed to
//! the callback only after the guard is dropped. A callback is therefore free
//! to call back into the same store, including re-adding the key it was
//! given.

use lapse_core::EvictionCallback;

/// Entries removed under the lock, waiting to be announced.
pub(crate) struct Evictions<T> {
    callback: Option<EvictionCallback<T>>,
    removed: Vec<(String, T)>,
    count: usize,
}

impl<T> Evictions<T> {
    /// Start collecting for the callback registered at the time of removal.
    /// Values are only retained when a callback is present.
    pub(crate) fn new(callback: Option<EvictionCallback<T>>) -> Self {
        Self {
            callback,
            removed: Vec::new(),
            count: 0,
        }
    }

    pub(crate) fn push(&mut self, key: String, value: T) {
        self.count += 1;
        if self.callback.is_some() {
            self.removed.push((key, value));
        }
    }

    /// Number of removed entries, whether or not a callback is registered.
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Invoke the callback once per removed entry. Must be called with no
    /// store lock held.
    pub(crate) fn dispatch(self) {
        let Some(callback) = self.callback else {
            return;
        };
        for (key, value) in self.removed {
            tracing::trace!(key = %key, "Dispatching eviction callback");
            callback(key, value);
        }
    }
}
