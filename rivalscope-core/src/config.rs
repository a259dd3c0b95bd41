//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/rivalscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/rivalscope/` (~/.config/rivalscope/)
//! - Data: `$XDG_DATA_HOME/rivalscope/` (~/.local/share/rivalscope/)
//! - State/Logs: `$XDG_STATE_HOME/rivalscope/` (~/.local/state/rivalscope/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable overriding the configured backend URL.
pub const API_URL_ENV: &str = "RIVALSCOPE_API_URL";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Local result-cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend (e.g., `http://localhost:8000`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Effective base URL: `RIVALSCOPE_API_URL` wins over the config file.
    pub fn base_url(&self) -> String {
        std::env::var(API_URL_ENV).unwrap_or_else(|_| self.base_url.clone())
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url();
        if url.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api.base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Local result-cache configuration
///
/// TTLs here are startup defaults; the signals TTL is replaced by the
/// server-side `signals_cache_duration_seconds` once settings load.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Seconds a cached signals response stays fresh
    #[serde(default = "default_signals_ttl_secs")]
    pub signals_ttl_secs: u64,

    /// Seconds a cached watchlist-run result stays fresh
    #[serde(default = "default_runs_ttl_secs")]
    pub runs_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            signals_ttl_secs: default_signals_ttl_secs(),
            runs_ttl_secs: default_runs_ttl_secs(),
        }
    }
}

fn default_signals_ttl_secs() -> u64 {
    3600
}

fn default_runs_ttl_secs() -> u64 {
    3600
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/rivalscope/config.toml` (~/.config/rivalscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("rivalscope").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite cache)
    ///
    /// `$XDG_DATA_HOME/rivalscope/` (~/.local/share/rivalscope/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("rivalscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/rivalscope/` (~/.local/state/rivalscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("rivalscope")
    }

    /// Returns the cache database file path
    ///
    /// `$XDG_DATA_HOME/rivalscope/cache.db` (~/.local/share/rivalscope/cache.db)
    pub fn store_path() -> PathBuf {
        Self::data_dir().join("cache.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/rivalscope/rivalscope.log` (~/.local/state/rivalscope/rivalscope.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("rivalscope.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.cache.signals_ttl_secs, 3600);
        assert_eq!(config.cache.runs_ttl_secs, 3600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://intel.internal:8443"
timeout_secs = 10

[cache]
signals_ttl_secs = 600

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.api.base_url, "https://intel.internal:8443");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.signals_ttl_secs, 600);
        // Unset fields keep their defaults
        assert_eq!(config.cache.runs_ttl_secs, 3600);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_api_config_validation() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());

        let config = ApiConfig {
            base_url: "localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
