//! Application configuration.
//!
//! Settings are read from a JSON file (by default
//! `<config_dir>/pomo/config.json`). Every field has a default, so a partial
//! or missing file is fine. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "pomo";

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.json";

fn default_minutes() -> u32 {
    25
}

fn default_title() -> String {
    "Focus Session".to_string()
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_notifications() -> bool {
    true
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`AppConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// AppConfig
// ============================================================================

/// Configuration for the timer application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Duration used by `start` when no minutes are given (1-1440)
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,

    /// Title used when a timer is added without one
    #[serde(default = "default_title")]
    pub default_title: String,

    /// How often the poller checks for expired timers (10-1000 ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Whether desktop notifications are sent on completion
    #[serde(default = "default_notifications")]
    pub notifications: bool,

    /// Where todos are stored; platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            default_title: default_title(),
            tick_interval_ms: default_tick_interval_ms(),
            notifications: default_notifications(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the
    /// platform default location is tried and defaults are used when no
    /// file is there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Returns the platform default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is out of range or the
    /// default title is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1440).contains(&self.default_minutes) {
            return Err(ConfigError::Invalid(
                "default_minutes must be between 1 and 1440".to_string(),
            ));
        }
        if !(10..=1000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be between 10 and 1000".to_string(),
            ));
        }
        if self.default_title.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_title must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Overrides the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Disables desktop notifications.
    #[must_use]
    pub fn without_notifications(mut self) -> Self {
        self.notifications = false;
        self
    }

    /// Resolves the data directory, falling back to the platform default.
    #[must_use]
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}
