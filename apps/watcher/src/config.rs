//! Watcher configuration.

use ffpinvest_alerts::PollerConfig;
use ffpinvest_feeds::RestConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Alert service endpoints.
    pub rest: RestConfig,
    /// Poll and popup timing.
    pub poller: PollerConfig,
    /// Device effect settings.
    pub effects: EffectSettings,
    /// SQLite URL for local preferences.
    pub database_url: String,
    /// Logging level.
    pub log_level: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            rest: RestConfig::default(),
            poller: PollerConfig::default(),
            effects: EffectSettings::default(),
            database_url: "sqlite://ffpinvest.db".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Device effect settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Play attempts per alert, including the first.
    pub sound_attempts: u32,
    /// Upper bound on each sound/vibration/notification call.
    pub timeout_ms: u64,
    /// Ring the terminal bell as the alert sound.
    pub terminal_bell: bool,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            sound_attempts: 2,
            timeout_ms: 5000,
            terminal_bell: true,
        }
    }
}

impl WatcherConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: display,
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.poller.poll_interval_secs, 10);
        assert_eq!(config.rest.open_path, "/get_open_alert");
        assert_eq!(config.effects.sound_attempts, 2);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatcherConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, WatcherConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rest": {{"base_url": "http://localhost:9000"}}, "poller": {{"popup_secs": 3}}}}"#
        )
        .unwrap();

        let config = WatcherConfig::load(file.path()).unwrap();
        assert_eq!(config.rest.base_url, "http://localhost:9000");
        assert_eq!(config.rest.close_path, "/get_close_alert");
        assert_eq!(config.poller.popup_secs, 3);
        assert_eq!(config.poller.poll_interval_secs, 10);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = WatcherConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_config_serialization() {
        let config = WatcherConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: WatcherConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
