//! # CLI Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TOPUP_DB_PATH=/var/lib/topup/topup.db                              │
//! │     TOPUP_HISTORY_LIMIT=20                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/topup/topup.toml (Linux)                                 │
//! │     ~/Library/Application Support/id.topup.topup/topup.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! log_filter = "info,topup=debug,sqlx=warn"
//!
//! [database]
//! path = "/home/rina/.local/share/topup/topup.db"
//! max_connections = 5
//!
//! [storefront]
//! history_limit = 10
//! currency_symbol = "Rp"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use topup_core::DEFAULT_HISTORY_LIMIT;

/// Largest history page the storefront will request.
pub const MAX_HISTORY_LIMIT: u32 = 100;

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first use.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size. Default: 5
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("id", "topup", "topup")
        .map(|dirs| dirs.data_dir().join("topup.db"))
        .unwrap_or_else(|| PathBuf::from("./topup.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[storefront]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSettings {
    /// Transactions shown in vault and profile views.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Prefix used when printing prices.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_history_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

fn default_currency_symbol() -> String {
    "Rp".to_string()
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        StorefrontSettings {
            history_limit: default_history_limit(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_log_filter() -> String {
    "info,sqlx=warn".to_string()
}

// =============================================================================
// TopupConfig
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopupConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub storefront: StorefrontSettings,

    /// `tracing` filter directive. `RUST_LOG` still wins when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TopupConfig {
    fn default() -> Self {
        TopupConfig {
            database: DatabaseSettings::default(),
            storefront: StorefrontSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl TopupConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, else the platform config dir)
    /// 3. `TOPUP_*` environment variables
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                info!(?path, "Loading config from file");
                Self::from_toml(&std::fs::read_to_string(&path)?)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => {
                    info!(?path, "Loading config from file");
                    Self::from_toml(&std::fs::read_to_string(&path)?)?
                }
                path => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.storefront.history_limit == 0 || self.storefront.history_limit > MAX_HISTORY_LIMIT
        {
            return Err(ConfigError::Invalid(format!(
                "storefront.history_limit must be between 1 and {}",
                MAX_HISTORY_LIMIT
            )));
        }

        if self.storefront.currency_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storefront.currency_symbol must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TOPUP_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TOPUP_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("TOPUP_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid TOPUP_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(limit) = lookup("TOPUP_HISTORY_LIMIT") {
            match limit.parse::<u32>() {
                Ok(n) => self.storefront.history_limit = n,
                Err(_) => warn!(value = %limit, "Ignoring invalid TOPUP_HISTORY_LIMIT"),
            }
        }

        if let Some(symbol) = lookup("TOPUP_CURRENCY_SYMBOL") {
            self.storefront.currency_symbol = symbol;
        }

        if let Some(filter) = lookup("TOPUP_LOG") {
            self.log_filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "topup", "topup")
            .map(|dirs| dirs.config_dir().join("topup.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TopupConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storefront.history_limit, 10);
        assert_eq!(config.storefront.currency_symbol, "Rp");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TopupConfig::from_toml(
            r#"
            [storefront]
            history_limit = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.storefront.history_limit, 25);
        assert_eq!(config.storefront.currency_symbol, "Rp");
        assert_eq!(config.log_filter, default_log_filter());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TopupConfig::from_toml("[database\npath = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TOPUP_DB_PATH", "/tmp/override.db"),
            ("TOPUP_HISTORY_LIMIT", "3"),
            ("TOPUP_DB_MAX_CONNECTIONS", "not-a-number"),
            ("TOPUP_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = TopupConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.storefront.history_limit, 3);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_validation() {
        let mut config = TopupConfig::default();
        config.storefront.history_limit = 0;
        assert!(config.validate().is_err());

        config.storefront.history_limit = MAX_HISTORY_LIMIT + 1;
        assert!(config.validate().is_err());

        config.storefront.history_limit = 10;
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        config.storefront.currency_symbol = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nmax_connections = 2").unwrap();

        let config = TopupConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.database.max_connections, 2);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = TopupConfig::load(Some(PathBuf::from("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
