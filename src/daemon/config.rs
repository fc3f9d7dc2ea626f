//! Service configuration.
//!
//! Loads settings from `~/.snapbooth/config.toml` unless another path is
//! given on the command line. A missing file yields defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! public_url = "https://booth.example.com"
//!
//! [storage]
//! data_dir = "/var/lib/snapbooth"
//!
//! [sweeper]
//! enabled = true
//! interval_secs = 600
//!
//! [logging]
//! format = "json"
//! level = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL_SECS};
use crate::daemon::error::Error;
use crate::daemon::logging::{LogConfig, LogFormat};
use crate::daemon::services::default_data_dir;

/// Environment variable overriding `server.host`.
const HOST_ENV: &str = "HOST";

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub sweeper: SweeperSettings,
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Base URL used to build share links. Share links are omitted when unset.
    pub public_url: Option<String>,
}

/// Where the databases live.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Defaults to `~/.snapbooth`
    pub data_dir: Option<PathBuf>,
}

/// Background eviction of expired sessions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweeperSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            public_url: None,
        }
    }
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

impl SweeperSettings {
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load configuration from `path`, or from `~/.snapbooth/config.toml`.
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid, returns an error.
    /// `HOST` in the environment overrides `server.host`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config not found, using defaults"
            );
            Self::default()
        };

        if let Ok(host) = std::env::var(HOST_ENV)
            && !host.trim().is_empty()
        {
            config.server.host = host;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default path to the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".snapbooth").join("config.toml"))
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must not be 0".to_string()));
        }
        if self.sweeper.enabled && self.sweeper.interval_secs == 0 {
            return Err(Error::Config(
                "sweeper.interval_secs must be greater than 0 when the sweeper is enabled"
                    .to_string(),
            ));
        }
        if let Some(url) = &self.server.public_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "server.public_url must start with http:// or https://, got '{url}'"
            )));
        }
        if tracing::Level::from_str(&self.logging.level).is_err() {
            return Err(Error::Config(format!(
                "logging.level '{}' is not a valid level",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Directory holding `sessions.redb` and `coupons.redb`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// Public base URL without a trailing slash.
    pub fn public_url(&self) -> Option<String> {
        self.server
            .public_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
    }

    /// Logging setup derived from the `[logging]` section.
    pub fn log_config(&self, verbose: bool) -> LogConfig {
        let level = if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::from_str(&self.logging.level).unwrap_or(tracing::Level::INFO)
        };
        LogConfig::default()
            .format(self.logging.format)
            .level(level)
    }
}
