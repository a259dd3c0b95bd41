//! Store repository layer
//!
//! Row-level operations for cache entries and fetch markers. TTL policy
//! lives one level up in [`crate::cache`]; this layer just reads and writes
//! rows and reports errors honestly.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// A raw cache row: serialized payload plus when it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized JSON payload
    pub payload: String,
    /// When the payload was written
    pub written_at: DateTime<Utc>,
}

/// Store handle with connection pooling (single connection for now)
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create a store at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this store
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Cache entry operations
    // ============================================

    /// Fetch an entry. Returns `None` when the key has never been written
    /// or was invalidated.
    pub fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT payload, written_at FROM cache_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            Self::row_to_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Insert or replace an entry, stamping it with the current time.
    pub fn put_entry(&self, namespace: &str, key: &str, payload: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO cache_entries (namespace, key, payload, written_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                namespace = excluded.namespace,
                payload = excluded.payload,
                written_at = excluded.written_at
            "#,
            params![namespace, key, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete a single entry. Deleting a missing key is not an error.
    pub fn delete_entry(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Delete every entry in a namespace. Returns how many rows went away.
    pub fn delete_namespace(&self, namespace: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM cache_entries WHERE namespace = ?1",
            params![namespace],
        )?;
        conn.execute(
            "DELETE FROM cache_markers WHERE namespace = ?1",
            params![namespace],
        )?;
        Ok(n)
    }

    /// Count live entries in a namespace.
    pub fn count_namespace(&self, namespace: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE namespace = ?1",
            params![namespace],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn row_to_entry(row: &Row) -> rusqlite::Result<CacheEntry> {
        let written_at_str: String = row.get("written_at")?;

        Ok(CacheEntry {
            payload: row.get("payload")?,
            // Unparseable timestamps read as maximally stale
            written_at: DateTime::parse_from_rfc3339(&written_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        })
    }

    // ============================================
    // Fetch marker operations
    // ============================================

    /// Record the time of the last successful fetch for a namespace.
    pub fn set_marker(&self, namespace: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO cache_markers (namespace, last_fetch_at)
            VALUES (?1, ?2)
            ON CONFLICT(namespace) DO UPDATE SET
                last_fetch_at = excluded.last_fetch_at
            "#,
            params![namespace, at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// When the namespace last saw a successful fetch, if ever.
    pub fn get_marker(&self, namespace: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let at: Option<String> = conn
            .query_row(
                "SELECT last_fetch_at FROM cache_markers WHERE namespace = ?1",
                params![namespace],
                |r| r.get(0),
            )
            .optional()?;
        Ok(at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Flip the connection read-only to exercise write-failure paths.
    #[cfg(test)]
    pub(crate) fn set_read_only(&self, read_only: bool) {
        let conn = self.conn.lock().unwrap();
        let flag = if read_only { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA query_only = {}", flag))
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.migrate().unwrap();
        store
    }

    #[test]
    fn test_entry_round_trip() {
        let store = test_store();

        assert!(store.get_entry("signals", "signals_all_all_all").unwrap().is_none());

        store
            .put_entry("signals", "signals_all_all_all", r#"[{"id":"sig-1"}]"#)
            .unwrap();

        let entry = store
            .get_entry("signals", "signals_all_all_all")
            .unwrap()
            .expect("entry should exist");
        assert_eq!(entry.payload, r#"[{"id":"sig-1"}]"#);
        assert!((Utc::now() - entry.written_at).num_seconds() < 5);
    }

    #[test]
    fn test_put_replaces_and_restamps() {
        let store = test_store();
        store.put_entry("signals", "k", "old").unwrap();

        // Backdate the first write so the restamp is observable
        store
            .connection()
            .execute(
                "UPDATE cache_entries SET written_at = ?1 WHERE key = 'k'",
                params![(Utc::now() - chrono::Duration::hours(2)).to_rfc3339()],
            )
            .unwrap();

        store.put_entry("signals", "k", "new").unwrap();
        let entry = store.get_entry("signals", "k").unwrap().unwrap();
        assert_eq!(entry.payload, "new");
        assert!((Utc::now() - entry.written_at).num_seconds() < 5);
    }

    #[test]
    fn test_delete_namespace_is_scoped() {
        let store = test_store();
        store.put_entry("signals", "signals_a", "1").unwrap();
        store.put_entry("signals", "signals_b", "2").unwrap();
        store.put_entry("runs", "runs_all", "3").unwrap();
        store.set_marker("signals", Utc::now()).unwrap();

        let deleted = store.delete_namespace("signals").unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count_namespace("signals").unwrap(), 0);
        assert_eq!(store.count_namespace("runs").unwrap(), 1);
        assert!(store.get_marker("signals").unwrap().is_none());
    }

    #[test]
    fn test_marker_round_trip() {
        let store = test_store();
        assert!(store.get_marker("signals").unwrap().is_none());

        let at = Utc::now();
        store.set_marker("signals", at).unwrap();
        let got = store.get_marker("signals").unwrap().unwrap();
        assert_eq!(got.timestamp(), at.timestamp());
    }

    #[test]
    fn test_unparseable_timestamp_reads_stale() {
        let store = test_store();
        store.put_entry("signals", "k", "v").unwrap();
        store
            .connection()
            .execute("UPDATE cache_entries SET written_at = 'garbage'", [])
            .unwrap();

        let entry = store.get_entry("signals", "k").unwrap().unwrap();
        assert_eq!(entry.written_at, DateTime::<Utc>::MIN_UTC);
    }
}
