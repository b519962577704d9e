//! Configuration management for FinditBack
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{FinditbackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for FinditBack
///
/// Holds the backend endpoint, chat polling behavior, session storage
/// location and logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat session settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Persisted login session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Interval between background refreshes of an open thread (seconds)
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

fn default_poll_interval_seconds() -> u64 {
    5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval_seconds(),
        }
    }
}

impl ChatConfig {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

/// Persisted login session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Keyring service name the session is stored under
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring account name the session is stored under
    #[serde(default = "default_keyring_account")]
    pub account: String,
}

fn default_keyring_service() -> String {
    "finditback".to_string()
}

fn default_keyring_account() -> String {
    "default".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keyring_service: default_keyring_service(),
            account: default_keyring_account(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON records instead of human-readable lines
    #[serde(default)]
    pub json_format: bool,

    /// Optional file that receives a copy of every record
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FinditbackError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FinditbackError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("FINDITBACK_API_URL") {
            tracing::debug!(base_url = %base_url, "Env override: FINDITBACK_API_URL");
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("FINDITBACK_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid FINDITBACK_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(interval) = std::env::var("FINDITBACK_POLL_INTERVAL_SECONDS") {
            if let Ok(value) = interval.parse() {
                self.chat.poll_interval_seconds = value;
            } else {
                tracing::warn!("Invalid FINDITBACK_POLL_INTERVAL_SECONDS: {}", interval);
            }
        }

        if let Ok(level) = std::env::var("FINDITBACK_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api.base_url).map_err(|e| {
            FinditbackError::Config(format!(
                "Invalid api.base_url '{}': {}",
                self.api.base_url, e
            ))
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(FinditbackError::Config(format!(
                "api.base_url must use http or https, got: {}",
                base.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(FinditbackError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.poll_interval_seconds == 0 {
            return Err(FinditbackError::Config(
                "chat.poll_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.keyring_service.trim().is_empty() {
            return Err(FinditbackError::Config(
                "session.keyring_service cannot be empty".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
