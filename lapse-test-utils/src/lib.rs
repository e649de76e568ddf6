//! LAPSE Test Utilities
//!
//! Shared test infrastructure for the LAPSE workspace:
//! - Proptest generators for keys, values, expirations and operation sequences
//! - An eviction recorder for asserting on callback traffic
//! - Fixtures for pre-seeded stores
//! - Polling helpers for janitor timing

pub use lapse_core::{CacheConfig, CacheError, CacheResult, Entry, Expiration, Timestamp};
pub use lapse_storage::{Cache, Store};

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for LAPSE inputs.

    use super::*;
    use proptest::prelude::*;

    /// Short lowercase keys, so sequences hit the same key often.
    pub fn arb_key() -> impl Strategy<Value = String> {
        "[a-e]{1,2}"
    }

    /// Any printable key, including empty.
    pub fn arb_any_key() -> impl Strategy<Value = String> {
        "\\PC{0,16}"
    }

    /// An expiration that will not lapse within a test run.
    pub fn arb_long_expiration() -> impl Strategy<Value = Expiration> {
        prop_oneof![
            Just(Expiration::Default),
            Just(Expiration::Never),
            (3600u64..86_400).prop_map(Expiration::after_secs),
        ]
    }

    /// Any expiration, including sentinel millisecond values.
    pub fn arb_expiration() -> impl Strategy<Value = Expiration> {
        prop_oneof![
            Just(Expiration::Default),
            Just(Expiration::Never),
            (-5i64..5).prop_map(Expiration::from_millis),
            (1u64..86_400_000).prop_map(Expiration::after_millis),
        ]
    }

    /// An entry that is already expired.
    pub fn arb_expired_entry<T: std::fmt::Debug + Clone>(
        value: impl Strategy<Value = T>,
    ) -> impl Strategy<Value = Entry<T>> {
        (value, 1i64..86_400).prop_map(|(value, ago)| {
            Entry::new(value, Some(Utc::now() - chrono::Duration::seconds(ago)))
        })
    }

    /// One store operation, applied by [`StoreCommand::apply`] against a model map.
    #[derive(Debug, Clone)]
    pub enum StoreCommand {
        Set(String, i64),
        Add(String, i64),
        Replace(String, i64),
        Delete(String),
        Increment(String, i64),
        Decrement(String, i64),
        DeleteExpired,
        Flush,
    }

    impl StoreCommand {
        /// Apply this operation to `store` with a never-expiring TTL and
        /// mirror its documented effect on `model`.
        pub fn apply(&self, store: &Store<i64>, model: &mut HashMap<String, i64>) {
            match self {
                StoreCommand::Set(key, value) => {
                    store.set(key.as_str(), *value, Expiration::Never);
                    model.insert(key.clone(), *value);
                }
                StoreCommand::Add(key, value) => {
                    let result = store.add(key.as_str(), *value, Expiration::Never);
                    if model.contains_key(key) {
                        assert_eq!(result, Err(CacheError::key_exists(key.as_str())));
                    } else {
                        assert_eq!(result, Ok(()));
                        model.insert(key.clone(), *value);
                    }
                }
                StoreCommand::Replace(key, value) => {
                    let result = store.replace(key.as_str(), *value, Expiration::Never);
                    if model.contains_key(key) {
                        assert_eq!(result, Ok(()));
                        model.insert(key.clone(), *value);
                    } else {
                        assert_eq!(result, Err(CacheError::key_not_found(key.as_str())));
                    }
                }
                StoreCommand::Delete(key) => {
                    store.delete(key);
                    model.remove(key);
                }
                StoreCommand::Increment(key, delta) => {
                    let result = store.increment(key, *delta);
                    match model.get_mut(key) {
                        Some(current) => {
                            *current = current.wrapping_add(*delta);
                            assert_eq!(result, Ok(*current));
                        }
                        None => assert_eq!(result, Err(CacheError::key_not_found(key.as_str()))),
                    }
                }
                StoreCommand::Decrement(key, delta) => {
                    let result = store.decrement(key, *delta);
                    match model.get_mut(key) {
                        Some(current) => {
                            *current = current.wrapping_sub(*delta);
                            assert_eq!(result, Ok(*current));
                        }
                        None => assert_eq!(result, Err(CacheError::key_not_found(key.as_str()))),
                    }
                }
                StoreCommand::DeleteExpired => {
                    assert_eq!(store.delete_expired(), 0);
                }
                StoreCommand::Flush => {
                    store.flush();
                    model.clear();
                }
            }
        }
    }

    /// Generate one store operation over [`arb_key`] keys.
    pub fn arb_store_op() -> impl Strategy<Value = StoreCommand> {
        prop_oneof![
            3 => (arb_key(), any::<i64>()).prop_map(|(k, v)| StoreCommand::Set(k, v)),
            2 => (arb_key(), any::<i64>()).prop_map(|(k, v)| StoreCommand::Add(k, v)),
            2 => (arb_key(), any::<i64>()).prop_map(|(k, v)| StoreCommand::Replace(k, v)),
            2 => arb_key().prop_map(StoreCommand::Delete),
            2 => (arb_key(), any::<i64>()).prop_map(|(k, v)| StoreCommand::Increment(k, v)),
            2 => (arb_key(), any::<i64>()).prop_map(|(k, v)| StoreCommand::Decrement(k, v)),
            1 => Just(StoreCommand::DeleteExpired),
            1 => Just(StoreCommand::Flush),
        ]
    }

    /// Generate a sequence of store operations.
    pub fn arb_store_ops(max_len: usize) -> impl Strategy<Value = Vec<StoreCommand>> {
        prop::collection::vec(arb_store_op(), 0..max_len)
    }
}

// ============================================================================
// EVICTION RECORDER
// ============================================================================

/// Collects every `(key, value)` handed to an eviction callback.
#[derive(Debug)]
pub struct EvictionRecorder<T> {
    seen: Arc<Mutex<Vec<(String, T)>>>,
}

impl<T> Clone for EvictionRecorder<T> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<T> Default for EvictionRecorder<T> {
    fn default() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> EvictionRecorder<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends to this recorder.
    pub fn callback(&self) -> impl Fn(String, T) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |key, value| {
            seen.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((key, value));
        }
    }

    /// Everything recorded so far, in callback order.
    pub fn events(&self) -> Vec<(String, T)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.events().into_iter().map(|(key, _)| key).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built stores for common scenarios.

    use super::*;

    /// An entry that expired one second ago.
    pub fn expired_entry<T>(value: T) -> Entry<T> {
        Entry::new(value, Some(Utc::now() - chrono::Duration::seconds(1)))
    }

    /// Config with no janitor and no default expiration.
    pub fn manual_config() -> CacheConfig {
        CacheConfig::new().without_janitor()
    }

    /// Config whose janitor sweeps every `interval`.
    pub fn sweeping_config(interval: Duration) -> CacheConfig {
        CacheConfig::new().with_cleanup_interval(interval)
    }

    /// Store holding `live` never-expiring and `expired` already-expired
    /// entries. Keys are `live-{i}` and `expired-{i}`; values are `i`.
    pub fn mixed_store(live: usize, expired: usize) -> Store<u64> {
        Store::from_items(Expiration::Default, mixed_items(live, expired))
    }

    /// The entries behind [`mixed_store`].
    pub fn mixed_items(live: usize, expired: usize) -> HashMap<String, Entry<u64>> {
        let live_entries = (0..live).map(|i| (format!("live-{i}"), Entry::persistent(i as u64)));
        let expired_entries =
            (0..expired).map(|i| (format!("expired-{i}"), expired_entry(i as u64)));
        live_entries.chain(expired_entries).collect()
    }
}

// ============================================================================
// WAITING
// ============================================================================

pub mod wait {
    //! Polling helpers for background work.

    use super::*;

    const POLL: Duration = Duration::from_millis(5);

    /// Poll `condition` on this thread until it holds or `timeout` elapses.
    pub fn until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if condition() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(POLL);
        }
    }

    /// Async [`until`], yielding to the runtime between polls.
    pub async fn until_async(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if condition() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL).await;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
