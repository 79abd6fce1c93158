#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkgsig
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pkgsig/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)
//!
//! The verification policy itself is fixed and never read from here.

use pkgsig_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable overriding the trusted keys file
pub const ENV_TRUSTED_KEYS: &str = "PKGSIG_TRUSTED_KEYS";
/// Environment variable overriding the default log filter
pub const ENV_LOG: &str = "PKGSIG_LOG";
/// Environment variable switching log output to JSON
pub const ENV_LOG_JSON: &str = "PKGSIG_LOG_JSON";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub trust: TrustConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Terminal color preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

/// General configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Where trusted signing keys come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustConfig {
    #[serde(default = "default_keys_file")]
    pub keys_file: PathBuf,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            keys_file: default_keys_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_keys_file() -> PathBuf {
    PathBuf::from("/etc/pkgsig/trusted_keys.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("pkgsig").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(keys) = std::env::var(ENV_TRUSTED_KEYS) {
            if keys.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_TRUSTED_KEYS.to_string(),
                    value: keys,
                }
                .into());
            }
            self.trust.keys_file = PathBuf::from(keys);
        }

        if let Ok(level) = std::env::var(ENV_LOG) {
            if level.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_LOG.to_string(),
                    value: level,
                }
                .into());
            }
            self.logging.level = level;
        }

        if let Ok(json) = std::env::var(ENV_LOG_JSON) {
            self.logging.json = parse_bool(ENV_LOG_JSON, json)?;
        }

        Ok(())
    }

    /// Serialize the configuration back to TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError {
                error: e.to_string(),
            })
            .map_err(Into::into)
    }
}
