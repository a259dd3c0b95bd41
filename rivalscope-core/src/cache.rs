//! TTL result cache over the local store.
//!
//! Expensive backend calls (signal detection, watchlist runs) are cached here
//! so tab switches and restarts render instantly. The contract is strict:
//!
//! - A read returns the payload only while the entry is younger than the
//!   namespace TTL. An expired entry is deleted on read and reported absent.
//! - Every failure mode degrades to a miss, never an error: corrupt payload,
//!   unreadable store, failed write. Callers refetch on miss, so a broken
//!   cache costs latency, not correctness.
//! - Invalidation is namespace-scoped. Clearing signals never touches runs.

use crate::store::Store;
use crate::types::{Severity, Signal, SignalType};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Cache namespaces. Each gets its own TTL and fetch marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Detected signals, keyed by filter combination
    Signals,
    /// Watchlist detection-run results
    Runs,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Signals => "signals",
            Namespace::Runs => "runs",
        }
    }
}

/// Active filters on the signals view.
///
/// `None` means "all". The filter combination is the cache key, so every
/// distinct view of the data gets its own entry and TTL clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalFilter {
    pub company_id: Option<String>,
    pub signal_type: Option<SignalType>,
    pub severity: Option<Severity>,
}

impl SignalFilter {
    /// Cache key for this filter combination: `signals_{company}_{type}_{severity}`
    /// with `all` standing in for unset dimensions.
    pub fn cache_key(&self) -> String {
        format!(
            "signals_{}_{}_{}",
            self.company_id.as_deref().unwrap_or("all"),
            self.signal_type.map(|t| t.as_str()).unwrap_or("all"),
            self.severity.map(|s| s.as_str()).unwrap_or("all"),
        )
    }

    /// Whether a signal passes this filter. Detection returns everything
    /// the crawler found; this is the local pass applied before the result
    /// list is cached and displayed.
    pub fn matches(&self, signal: &Signal) -> bool {
        if let Some(company_id) = &self.company_id {
            if &signal.company_id != company_id {
                return false;
            }
        }
        if let Some(signal_type) = self.signal_type {
            if signal.signal_type != signal_type {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if signal.severity != severity {
                return false;
            }
        }
        true
    }
}

/// Cache key for a watchlist-run result set.
pub fn run_key(company_id: Option<&str>) -> String {
    format!("runs_{}", company_id.unwrap_or("all"))
}

/// The result cache. One instance, owned by the app; all TTL policy
/// lives here.
pub struct ResultCache {
    store: Arc<Store>,
    signals_ttl: Duration,
    runs_ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<Store>, config: &crate::config::CacheConfig) -> Self {
        Self {
            store,
            signals_ttl: Duration::seconds(config.signals_ttl_secs as i64),
            runs_ttl: Duration::seconds(config.runs_ttl_secs as i64),
        }
    }

    fn ttl(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::Signals => self.signals_ttl,
            Namespace::Runs => self.runs_ttl,
        }
    }

    /// Current TTL in seconds, for the footer display.
    pub fn ttl_secs(&self, namespace: Namespace) -> i64 {
        self.ttl(namespace).num_seconds()
    }

    /// Replace a namespace TTL. Called when server settings arrive with a
    /// different `signals_cache_duration_seconds`.
    pub fn set_ttl(&mut self, namespace: Namespace, secs: u64) {
        let ttl = Duration::seconds(secs as i64);
        match namespace {
            Namespace::Signals => self.signals_ttl = ttl,
            Namespace::Runs => self.runs_ttl = ttl,
        }
    }

    /// Read a cached payload. Absent, expired, or unreadable all come back
    /// as `None`; expired and corrupt entries are deleted on the way out.
    pub fn read(&self, namespace: Namespace, key: &str) -> Option<serde_json::Value> {
        let entry = match self.store.get_entry(namespace.as_str(), key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(namespace = namespace.as_str(), key, error = %e, "cache read failed");
                return None;
            }
        };

        let age = Utc::now() - entry.written_at;
        if age > self.ttl(namespace) {
            tracing::debug!(
                namespace = namespace.as_str(),
                key,
                age_secs = age.num_seconds(),
                "cache entry expired"
            );
            if let Err(e) = self.store.delete_entry(key) {
                tracing::warn!(key, error = %e, "failed to delete expired entry");
            }
            return None;
        }

        match serde_json::from_str(&entry.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(namespace = namespace.as_str(), key, error = %e, "corrupt cache payload");
                if let Err(e) = self.store.delete_entry(key) {
                    tracing::warn!(key, error = %e, "failed to delete corrupt entry");
                }
                None
            }
        }
    }

    /// Write a payload and bump the namespace fetch marker. Failures are
    /// logged and swallowed; the next read is simply a miss.
    pub fn write(&self, namespace: Namespace, key: &str, value: &serde_json::Value) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize cache payload");
                return;
            }
        };
        if let Err(e) = self.store.put_entry(namespace.as_str(), key, &payload) {
            tracing::warn!(namespace = namespace.as_str(), key, error = %e, "cache write failed");
            return;
        }
        if let Err(e) = self.store.set_marker(namespace.as_str(), Utc::now()) {
            tracing::warn!(namespace = namespace.as_str(), error = %e, "failed to set fetch marker");
        }
    }

    /// Typed read: a payload that no longer matches the expected shape is
    /// a miss, not an error.
    pub fn read_json<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> Option<T> {
        let value = self.read(namespace, key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::warn!(namespace = namespace.as_str(), key, error = %e, "cache payload shape mismatch");
                None
            }
        }
    }

    /// Typed write.
    pub fn write_json<T: Serialize>(&self, namespace: Namespace, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.write(namespace, key, &json),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize cache payload");
            }
        }
    }

    /// Drop every entry in a namespace. Returns how many entries existed.
    pub fn invalidate_all(&self, namespace: Namespace) -> usize {
        match self.store.delete_namespace(namespace.as_str()) {
            Ok(n) => {
                tracing::info!(namespace = namespace.as_str(), entries = n, "cache invalidated");
                n
            }
            Err(e) => {
                tracing::warn!(namespace = namespace.as_str(), error = %e, "cache invalidation failed");
                0
            }
        }
    }

    /// When this namespace last saw a successful fetch, if ever.
    pub fn last_fetch(&self, namespace: Namespace) -> Option<DateTime<Utc>> {
        match self.store.get_marker(namespace.as_str()) {
            Ok(marker) => marker,
            Err(e) => {
                tracing::warn!(namespace = namespace.as_str(), error = %e, "failed to read fetch marker");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use rusqlite::params;
    use serde_json::json;

    fn test_cache() -> (Arc<Store>, ResultCache) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        store.migrate().unwrap();
        let cache = ResultCache::new(store.clone(), &CacheConfig::default());
        (store, cache)
    }

    /// Pretend the entry was written `secs` seconds ago.
    fn backdate(store: &Store, key: &str, secs: i64) {
        let written_at = (Utc::now() - Duration::seconds(secs)).to_rfc3339();
        let updated = store
            .connection()
            .execute(
                "UPDATE cache_entries SET written_at = ?1 WHERE key = ?2",
                params![written_at, key],
            )
            .unwrap();
        assert_eq!(updated, 1, "expected to backdate exactly one row");
    }

    #[test]
    fn fresh_write_reads_back() {
        let (_store, cache) = test_cache();
        let payload = json!([{"id": "sig-1", "title": "Pro plan price up"}]);

        cache.write(Namespace::Signals, "signals_all_all_all", &payload);
        let got = cache.read(Namespace::Signals, "signals_all_all_all");
        assert_eq!(got, Some(payload));
    }

    #[test]
    fn ttl_boundary_read_then_expiry() {
        // TTL 3600: a read at t=1800 hits, a read at t=4000 misses and
        // removes the entry.
        let (store, cache) = test_cache();
        let payload = json!([{"id": 1, "type": "pricing_change"}]);
        cache.write(Namespace::Signals, "signals_all_all_all", &payload);

        backdate(&store, "signals_all_all_all", 1800);
        assert_eq!(
            cache.read(Namespace::Signals, "signals_all_all_all"),
            Some(payload)
        );

        backdate(&store, "signals_all_all_all", 4000);
        assert_eq!(cache.read(Namespace::Signals, "signals_all_all_all"), None);
        assert!(
            store
                .get_entry("signals", "signals_all_all_all")
                .unwrap()
                .is_none(),
            "expired entry should be deleted on read"
        );
    }

    #[test]
    fn shorter_ttl_applies_to_later_reads() {
        let (store, cache) = test_cache();
        let mut cache = cache;
        cache.write(Namespace::Signals, "signals_all_all_all", &json!([]));
        backdate(&store, "signals_all_all_all", 600);

        // Fresh under the default hour
        assert!(cache.read(Namespace::Signals, "signals_all_all_all").is_some());

        // Server settings tighten the TTL below the entry's age
        cache.set_ttl(Namespace::Signals, 300);
        assert!(cache.read(Namespace::Signals, "signals_all_all_all").is_none());
    }

    #[test]
    fn invalidation_is_namespace_scoped() {
        let (_store, cache) = test_cache();
        cache.write(Namespace::Signals, "signals_all_all_all", &json!([1]));
        cache.write(Namespace::Signals, "signals_co1_all_all", &json!([2]));
        cache.write(Namespace::Runs, "runs_all", &json!([3]));

        let dropped = cache.invalidate_all(Namespace::Signals);
        assert_eq!(dropped, 2);
        assert!(cache.read(Namespace::Signals, "signals_all_all_all").is_none());
        assert!(cache.read(Namespace::Signals, "signals_co1_all_all").is_none());
        assert_eq!(cache.read(Namespace::Runs, "runs_all"), Some(json!([3])));
    }

    #[test]
    fn corrupt_payload_is_a_miss() {
        let (store, cache) = test_cache();
        store
            .put_entry("signals", "signals_all_all_all", "{not json")
            .unwrap();

        assert!(cache.read(Namespace::Signals, "signals_all_all_all").is_none());
        // And the broken row is gone
        assert!(store
            .get_entry("signals", "signals_all_all_all")
            .unwrap()
            .is_none());
    }

    #[test]
    fn failed_write_degrades_to_miss() {
        let (store, cache) = test_cache();
        store.set_read_only(true);

        // Must not panic or error out
        cache.write(Namespace::Signals, "signals_all_all_all", &json!([1]));

        store.set_read_only(false);
        assert!(cache.read(Namespace::Signals, "signals_all_all_all").is_none());
    }

    #[test]
    fn failed_read_degrades_to_miss() {
        let (store, cache) = test_cache();
        cache.write(Namespace::Signals, "k", &json!(1));
        store
            .connection()
            .execute_batch("DROP TABLE cache_entries")
            .unwrap();

        assert!(cache.read(Namespace::Signals, "k").is_none());
    }

    #[test]
    fn write_updates_fetch_marker() {
        let (_store, cache) = test_cache();
        assert!(cache.last_fetch(Namespace::Signals).is_none());

        cache.write(Namespace::Signals, "signals_all_all_all", &json!([]));
        let at = cache.last_fetch(Namespace::Signals).unwrap();
        assert!((Utc::now() - at).num_seconds() < 5);

        // Runs marker untouched
        assert!(cache.last_fetch(Namespace::Runs).is_none());
    }

    #[test]
    fn typed_round_trip_and_shape_mismatch() {
        let (_store, cache) = test_cache();
        let rows = vec!["a".to_string(), "b".to_string()];
        cache.write_json(Namespace::Runs, "runs_all", &rows);

        let back: Option<Vec<String>> = cache.read_json(Namespace::Runs, "runs_all");
        assert_eq!(back, Some(rows));

        // Same payload read as the wrong shape is a miss
        let wrong: Option<Vec<u64>> = cache.read_json(Namespace::Runs, "runs_all");
        assert!(wrong.is_none());
    }

    #[test]
    fn filter_cache_keys() {
        assert_eq!(SignalFilter::default().cache_key(), "signals_all_all_all");

        let filter = SignalFilter {
            company_id: Some("co-1".to_string()),
            signal_type: Some(SignalType::PricingChange),
            severity: Some(Severity::High),
        };
        assert_eq!(filter.cache_key(), "signals_co-1_pricing_change_high");

        let filter = SignalFilter {
            severity: Some(Severity::Low),
            ..Default::default()
        };
        assert_eq!(filter.cache_key(), "signals_all_all_low");

        assert_eq!(run_key(None), "runs_all");
        assert_eq!(run_key(Some("co-2")), "runs_co-2");
    }

    #[test]
    fn filter_matches_signals() {
        let signal: Signal = serde_json::from_value(json!({
            "id": "sig-1",
            "company_id": "co-1",
            "type": "pricing_change",
            "severity": "high",
            "title": "t",
            "detected_at": "2025-06-01T12:00:00Z"
        }))
        .unwrap();

        assert!(SignalFilter::default().matches(&signal));
        assert!(SignalFilter {
            company_id: Some("co-1".into()),
            signal_type: Some(SignalType::PricingChange),
            severity: Some(Severity::High),
        }
        .matches(&signal));
        assert!(!SignalFilter {
            company_id: Some("co-2".into()),
            ..Default::default()
        }
        .matches(&signal));
        assert!(!SignalFilter {
            severity: Some(Severity::Low),
            ..Default::default()
        }
        .matches(&signal));
    }
}
