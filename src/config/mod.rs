//! Configuration management for murmur.
//!
//! Configuration is read from `~/.config/murmur/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod credentials;

pub use credentials::TokenSource;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub feed: FeedConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, including the `/api` prefix
    pub base_url: String,

    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,

    /// File holding the bearer token
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 10,
            token_file: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Paginator behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// How recent a current-user post must be to jump to the top (default: 300)
    pub recent_own_window_secs: u64,

    /// Revert optimistic changes when the server rejects them (default: true)
    pub rollback_on_error: bool,

    /// Buffered events per subscriber before the slowest one starts lagging
    pub event_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            recent_own_window_secs: 300,
            rollback_on_error: true,
            event_capacity: 64,
        }
    }
}

impl FeedConfig {
    /// Values too large for a `chrono::Duration` saturate to its maximum.
    pub fn recent_own_window(&self) -> chrono::Duration {
        i64::try_from(self.recent_own_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it if missing.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/murmur/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("murmur").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url).map_err(|e| ConfigError::Invalid {
            field: "api.base_url",
            reason: e.to_string(),
        })?;
        if self.feed.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "feed.event_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# murmur configuration

[api]
# REST API root, including the /api prefix. Media paths are served from
# the same host under /storage.
base_url = "http://localhost:8000/api"

# Request timeout in seconds
timeout_secs = 10

# Bearer token file. MURMUR_TOKEN takes precedence; when neither is set the
# token is read from <data dir>/murmur/token.
# token_file = "/home/me/.murmur-token"

[feed]
# Your own posts younger than this many seconds are shown first
recent_own_window_secs = 300

# Undo optimistic reactions/deletes when the server rejects them
rollback_on_error = true

# Events buffered per subscriber
event_capacity = 64
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.feed.recent_own_window_secs, 300);
        assert!(config.feed.rollback_on_error);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[feed]
rollback_on_error = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert!(!config.feed.rollback_on_error);
        assert_eq!(config.feed.event_capacity, 64);
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.feed.recent_own_window(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_huge_recent_window_saturates() {
        let feed = FeedConfig {
            recent_own_window_secs: u64::MAX,
            ..FeedConfig::default()
        };
        assert_eq!(feed.recent_own_window(), chrono::Duration::MAX);

        let feed = FeedConfig {
            recent_own_window_secs: i64::MAX as u64,
            ..FeedConfig::default()
        };
        assert_eq!(feed.recent_own_window(), chrono::Duration::MAX);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api.timeout_secs, 10);

        // Second load reads the file we just wrote
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.api.base_url, config.api.base_url);
    }

    #[test]
    fn test_load_rejects_bad_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nbase_url = \"not a url\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "api.base_url", .. }));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feed\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
