//! Central holder for server-side settings.
//!
//! Exactly one copy of the settings blob lives here; every consumer that
//! needs the signals-cache TTL asks this service instead of carrying its own
//! fetch. Until the first fetch lands, defaults apply.

use crate::types::ServerSettings;

/// Signals-cache TTL used before server settings arrive.
pub const DEFAULT_SIGNALS_TTL_SECS: u64 = 3600;

/// In-memory settings service.
#[derive(Debug, Default)]
pub struct SettingsService {
    cached: Option<ServerSettings>,
}

impl SettingsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached copy with a fresh one from the server.
    pub fn update(&mut self, settings: ServerSettings) {
        self.cached = Some(settings);
    }

    /// The current settings, if any fetch has landed.
    pub fn get(&self) -> Option<&ServerSettings> {
        self.cached.as_ref()
    }

    /// Drop the cached copy, forcing the next consumer to refetch.
    pub fn clear(&mut self) {
        self.cached = None;
    }

    /// Effective signals-cache TTL in seconds: the server's
    /// `signals_cache_duration_seconds`, or the default before settings load.
    pub fn signals_ttl_secs(&self) -> u64 {
        self.cached
            .as_ref()
            .map(|s| s.signals_cache_duration_seconds)
            .unwrap_or(DEFAULT_SIGNALS_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_defaults_until_settings_arrive() {
        let mut service = SettingsService::new();
        assert!(service.get().is_none());
        assert_eq!(service.signals_ttl_secs(), 3600);

        let settings = ServerSettings {
            signals_cache_duration_seconds: 600,
            ..Default::default()
        };
        service.update(settings);
        assert_eq!(service.signals_ttl_secs(), 600);

        service.clear();
        assert_eq!(service.signals_ttl_secs(), 3600);
    }
}
