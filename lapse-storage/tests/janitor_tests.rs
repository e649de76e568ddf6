//! Janitor and Cache Lifecycle Tests
//!
//! - expired entries are physically removed within a few intervals
//! - each swept entry fires the eviction callback exactly once
//! - dropping the last handle stops the janitor; dropping one clone does not
//! - the janitor keeps sweeping after the runtime that built the cache is gone

use lapse_core::{CacheConfig, Expiration};
use lapse_storage::{Cache, StatsObserver, StoreObserver};
use lapse_test_utils::{fixtures, wait, EvictionRecorder};
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_millis(20);
const PATIENCE: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_janitor_removes_expired_entries() {
    let recorder = EvictionRecorder::new();
    let cache = Cache::builder()
        .config(fixtures::sweeping_config(INTERVAL))
        .on_evicted(recorder.callback())
        .build();

    cache.set("short", 1u32, Expiration::after_millis(10));
    cache.set("long", 2u32, Expiration::Never);
    assert!(cache.janitor_running());

    assert!(wait::until_async(PATIENCE, || cache.item_count() == 1).await);
    assert_eq!(cache.get("long"), Some(2));
    assert_eq!(recorder.events(), vec![("short".to_string(), 1)]);

    // Further sweeps must not report the same entry again.
    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(recorder.len(), 1);
}

#[tokio::test]
async fn test_overwritten_entry_is_not_evicted() {
    let recorder = EvictionRecorder::new();
    let cache = Cache::builder()
        .config(fixtures::sweeping_config(INTERVAL))
        .on_evicted(recorder.callback())
        .build();

    cache.set("k", "first", Expiration::after_millis(40));
    cache.set("k", "second", Expiration::after_millis(40));

    assert!(wait::until_async(PATIENCE, || cache.item_count() == 0).await);
    assert_eq!(recorder.events(), vec![("k".to_string(), "second")]);
}

#[tokio::test]
async fn test_janitor_seeded_expired_items() {
    let recorder = EvictionRecorder::new();
    let cache = Cache::builder()
        .config(fixtures::sweeping_config(INTERVAL))
        .items(fixtures::mixed_items(2, 3))
        .on_evicted(recorder.callback())
        .build();

    assert!(wait::until_async(PATIENCE, || cache.item_count() == 2).await);
    assert_eq!(
        recorder.keys(),
        vec!["expired-0", "expired-1", "expired-2"]
    );
}

#[tokio::test]
async fn test_janitor_notifies_observer() {
    let stats = Arc::new(StatsObserver::new());
    let cache: Cache<u8> = Cache::builder()
        .config(fixtures::sweeping_config(INTERVAL))
        .observer(Arc::clone(&stats) as Arc<dyn StoreObserver>)
        .build();
    cache.set("k", 1, Expiration::after_millis(5));

    assert!(wait::until_async(PATIENCE, || stats.snapshot().expired_removed == 1).await);
    let snapshot = stats.snapshot();
    assert!(snapshot.janitor_runs >= 1);
    assert!(snapshot.last_janitor_run.is_some());
    assert_eq!(snapshot.sets, 1);
}

#[tokio::test]
async fn test_dropping_last_handle_stops_janitor() {
    let cache: Cache<u32> = Cache::with_config(fixtures::sweeping_config(INTERVAL));
    let store = cache.store();
    assert_eq!(Arc::strong_count(&store), 3);

    drop(cache);
    // Only our reference remains once the sweep loop has exited.
    assert!(wait::until_async(PATIENCE, || Arc::strong_count(&store) == 1).await);
}

#[tokio::test]
async fn test_dropping_one_clone_keeps_janitor() {
    let cache: Cache<u32> = Cache::with_config(fixtures::sweeping_config(INTERVAL));
    let clone = cache.clone();

    drop(clone);
    tokio::time::sleep(INTERVAL * 3).await;
    assert!(cache.janitor_running());

    cache.set("short", 1, Expiration::after_millis(5));
    assert!(wait::until_async(PATIENCE, || cache.item_count() == 0).await);
}

#[tokio::test]
async fn test_close_stops_sweeping_but_keeps_store() {
    let cache: Cache<u32> = Cache::with_config(fixtures::sweeping_config(INTERVAL));
    cache.close();
    assert!(wait::until_async(PATIENCE, || !cache.janitor_running()).await);

    cache.set("short", 1, Expiration::after_millis(5));
    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(cache.get("short"), None);
    assert_eq!(cache.item_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_janitor_on_multi_thread_runtime() {
    let cache = Cache::new(Expiration::after_millis(10), INTERVAL);
    for i in 0..50u32 {
        cache.set_default(format!("k{i}"), i);
    }
    assert!(wait::until_async(PATIENCE, || cache.item_count() == 0).await);
}

#[test]
fn test_janitor_without_runtime() {
    let recorder = EvictionRecorder::new();
    let cache = Cache::builder()
        .config(fixtures::sweeping_config(INTERVAL))
        .on_evicted(recorder.callback())
        .build();
    assert!(cache.janitor_running());

    cache.set("short", 7u64, Expiration::after_millis(5));
    assert!(wait::until(PATIENCE, || recorder.len() == 1));
    assert_eq!(cache.item_count(), 0);

    let store = cache.store();
    drop(cache);
    assert!(wait::until(PATIENCE, || Arc::strong_count(&store) == 1));
}

#[test]
fn test_janitor_outlives_creating_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let cache: Cache<u32> =
        runtime.block_on(async { Cache::with_config(fixtures::sweeping_config(INTERVAL)) });
    drop(runtime);

    assert!(cache.janitor_running());
    cache.set("short", 1, Expiration::after_millis(5));
    assert!(wait::until(PATIENCE, || cache.item_count() == 0));
    assert!(cache.janitor_running());
}

#[test]
fn test_zero_interval_means_no_janitor() {
    let cache: Cache<u8> = Cache::with_config(CacheConfig::new().without_janitor());
    assert!(!cache.janitor_running());
    assert_eq!(cache.cleanup_interval(), None);
    assert_eq!(Arc::strong_count(&cache.store()), 2);
}
