//! Integration tests for the on-disk store and result cache.

use std::sync::Arc;

use rivalscope_core::config::CacheConfig;
use rivalscope_core::{Namespace, ResultCache, Store};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> Arc<Store> {
    let path = dir.path().join("cache.db");
    let store = Store::open(&path).expect("store should open");
    store.migrate().expect("migrations should run");
    Arc::new(store)
}

#[test]
fn cache_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let payload = serde_json::json!([{"id": "sig-1", "title": "price up"}]);

    {
        let store = open_store(&dir);
        let cache = ResultCache::new(store, &CacheConfig::default());
        cache.write(Namespace::Signals, "signals_all_all_all", &payload);
    }

    // A fresh process sees the same entry
    let store = open_store(&dir);
    let cache = ResultCache::new(store, &CacheConfig::default());
    assert_eq!(
        cache.read(Namespace::Signals, "signals_all_all_all"),
        Some(payload)
    );
    assert!(cache.last_fetch(Namespace::Signals).is_some());
}

#[test]
fn migrate_is_idempotent_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");

    let store = Store::open(&path).unwrap();
    store.migrate().unwrap();
    store.migrate().unwrap();
    drop(store);

    let store = Store::open(&path).unwrap();
    store.migrate().unwrap();
    store.put_entry("signals", "k", "[]").unwrap();
    assert_eq!(store.count_namespace("signals").unwrap(), 1);
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/cache.db");

    let store = Store::open(&path).expect("open should create parents");
    store.migrate().unwrap();
    assert!(path.exists());
}

#[test]
fn invalidation_scoping_persists() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let cache = ResultCache::new(store, &CacheConfig::default());

    cache.write(Namespace::Signals, "signals_all_all_all", &serde_json::json!([1]));
    cache.write(Namespace::Runs, "runs_all", &serde_json::json!([2]));
    cache.invalidate_all(Namespace::Signals);
    drop(cache);

    let store = open_store(&dir);
    let cache = ResultCache::new(store, &CacheConfig::default());
    assert!(cache.read(Namespace::Signals, "signals_all_all_all").is_none());
    assert!(cache.read(Namespace::Runs, "runs_all").is_some());
}
