//! Local SQLite store backing the result cache.

pub mod repo;
pub mod schema;

pub use repo::{CacheEntry, Store};
pub use schema::SCHEMA_VERSION;
