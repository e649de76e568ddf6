//! Trait Surface, Observer and Snapshot Tests
//!
//! - Store, Cache and NoopCache are interchangeable behind the traits
//! - observers see every operation
//! - snapshots survive a file round trip and never clobber live keys

use lapse_core::{CacheConfig, CacheError, Entry, Expiration};
use lapse_storage::{
    Cache, Cacher, NoopCache, NumericCacher, PrometheusObserver, StatsObserver, Store,
    StoreObserver,
};
use lapse_test_utils::fixtures;
use prometheus::Registry;
use std::collections::HashMap;
use std::sync::Arc;

fn exercise(cache: &dyn NumericCacher<i32>) {
    cache.set("a", 1, Expiration::Never);
    cache.set_default("b", 2);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.add("a", 9, Expiration::Never), Err(CacheError::key_exists("a")));
    assert_eq!(cache.replace("b", 3, Expiration::Never), Ok(()));
    assert_eq!(cache.increment("b", 4), Ok(7));
    assert_eq!(cache.decrement("a", 2), Ok(-1));
    assert_eq!(cache.item_count(), 2);
    assert_eq!(cache.items().len(), 2);
    cache.delete("a");
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.delete_expired(), 0);
    cache.flush();
    assert_eq!(cache.item_count(), 0);
}

#[test]
fn test_store_behind_trait() {
    let store: Store<i32> = Store::new(Expiration::Default);
    exercise(&store);
}

#[test]
fn test_cache_behind_trait() {
    let cache: Cache<i32> = Cache::with_config(fixtures::manual_config());
    exercise(&cache);
}

#[test]
fn test_owned_keys_with_traits_in_scope() {
    // `Cacher` is imported here; both types must still take owned keys.
    let store: Store<u32> = Store::new(Expiration::Default);
    let cache: Cache<u32> = Cache::with_config(fixtures::manual_config());

    for i in 0..3u32 {
        store.set(format!("k{i}"), i, Expiration::Never);
        cache.set(format!("k{i}"), i, Expiration::Never);
    }
    cache.set_default(String::from("d"), 7);
    assert_eq!(cache.add(String::from("d"), 8, Expiration::Never), Err(CacheError::key_exists("d")));
    assert_eq!(cache.replace(String::from("d"), 9, Expiration::Never), Ok(()));
    assert_eq!(cache.increment("d", 1), Ok(10));

    assert_eq!(store.items(), {
        let mut items = cache.items();
        items.remove("d");
        items
    });
}

#[test]
fn test_trait_objects_are_shareable() {
    let caches: Vec<Arc<dyn Cacher<String>>> = vec![
        Arc::new(Store::new(Expiration::Default)),
        Arc::new(Cache::with_config(fixtures::manual_config())),
        Arc::new(NoopCache::new()),
    ];

    for cache in &caches {
        cache.set("k", "v".to_string(), Expiration::Never);
    }
    let hits: Vec<bool> = caches.iter().map(|c| c.get("k").is_some()).collect();
    assert_eq!(hits, vec![true, true, false]);
}

#[test]
fn test_noop_behind_trait() {
    let noop: Arc<dyn NumericCacher<u64>> = Arc::new(NoopCache::new());
    noop.set("k", 1, Expiration::Never);
    assert_eq!(noop.get("k"), None);
    assert_eq!(noop.add("k", 1, Expiration::Never), Ok(()));
    assert_eq!(noop.replace("k", 1, Expiration::Never), Ok(()));
    assert_eq!(noop.increment("k", 1), Err(CacheError::key_not_found("k")));
    assert_eq!(noop.item_count(), 0);
}

#[test]
fn test_stats_observer_counts_operations() {
    let stats = Arc::new(StatsObserver::new());
    let store = Store::new(Expiration::Default)
        .with_observer(Arc::clone(&stats) as Arc<dyn StoreObserver>);

    store.set("a", 1u32, Expiration::Never);
    store.get("a");
    store.get("missing");
    let _ = store.add("a", 2, Expiration::Never);
    let _ = store.replace("zzz", 2, Expiration::Never);
    store.increment("a", 1).unwrap();
    let _ = store.decrement("zzz", 1);
    store.delete("a");
    store.flush();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.sets, 1);
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.rejected_writes, 2);
    assert_eq!(snapshot.increments, 1);
    assert_eq!(snapshot.failed_mutations, 1);
    assert_eq!(snapshot.deletes, 1);
    assert_eq!(snapshot.flushes, 1);
    assert_eq!(snapshot.item_count, 0);
    assert!((snapshot.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_prometheus_observer_through_cache() {
    let registry = Registry::new();
    let observer = Arc::new(PrometheusObserver::new(&registry).unwrap());
    let cache: Cache<u32> = Cache::builder()
        .config(fixtures::manual_config())
        .observer(Arc::clone(&observer) as Arc<dyn StoreObserver>)
        .build();

    cache.set("a", 1, Expiration::Never);
    cache.set("b", 2, Expiration::Never);
    cache.delete("a");

    assert_eq!(observer.items.get(), 1);
    assert_eq!(observer.evictions_total.get(), 1);
    assert_eq!(
        observer
            .operations_total
            .with_label_values(&["set", "success"])
            .get(),
        2
    );
    assert!(observer.encode().unwrap().contains("lapse_evictions_total 1"));
}

#[test]
fn test_snapshot_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let source = fixtures::mixed_store(4, 2);
    source.set("ttl", 99, Expiration::after_secs(600));
    source.save_file(&path).unwrap();

    let target = Store::new(Expiration::Default);
    assert_eq!(target.load_file(&path).unwrap(), 5);
    assert_eq!(target.items(), source.items());
    assert_eq!(target.get("expired-0"), None);
}

#[test]
fn test_load_replaces_expired_local_entry() {
    let mut remote = HashMap::new();
    remote.insert("expired-0".to_string(), Entry::persistent(500u64));
    remote.insert("live-0".to_string(), Entry::persistent(600u64));
    let source = Store::from_items(Expiration::Default, remote);
    let mut buffer = Vec::new();
    source.save(&mut buffer).unwrap();

    let target = fixtures::mixed_store(1, 1);
    assert_eq!(target.load(buffer.as_slice()).unwrap(), 1);
    assert_eq!(target.get("expired-0"), Some(500));
    assert_eq!(target.get("live-0"), Some(0));
}

#[test]
fn test_load_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store: Store<u8> = Store::new(Expiration::Default);
    let err = store.load_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CacheError::Io { .. }));
}

#[test]
fn test_cache_from_env_style_config() {
    let config = CacheConfig::from_lookup(|name| match name {
        "LAPSE_DEFAULT_EXPIRATION_MS" => Some("-1".to_string()),
        "LAPSE_CLEANUP_INTERVAL_MS" => Some("0".to_string()),
        _ => None,
    })
    .unwrap();

    let cache: Cache<u8> = Cache::with_config(config);
    assert!(!cache.janitor_running());
    assert_eq!(cache.default_ttl(), None);
}
