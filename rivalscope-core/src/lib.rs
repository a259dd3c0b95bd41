//! # rivalscope-core
//!
//! Core library for rivalscope - a terminal front end for a
//! competitor-intelligence backend.
//!
//! This library provides:
//! - Wire types for companies, signals, tear-sheets, and reports
//! - An async HTTP client covering every backend endpoint
//! - A TTL result cache over SQLite so expensive calls render instantly
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Backend:** owns all competitor data; reached via [`ApiClient`]
//! - **Cache:** [`ResultCache`] keeps recent responses fresh for a TTL,
//!   degrading every failure to a miss
//! - **Views:** the TUI reads cache-first and refetches on miss
//!
//! ## Example
//!
//! ```rust,no_run
//! use rivalscope_core::{Config, Store};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open the cache store
//! let store = Store::open(&Config::store_path()).expect("failed to open store");
//! store.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use api::ApiClient;
pub use cache::{run_key, Namespace, ResultCache, SignalFilter};
pub use config::Config;
pub use error::{Error, Result};
pub use settings::SettingsService;
pub use store::Store;
pub use types::*;

// Public modules
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod settings;
pub mod store;
pub mod types;
