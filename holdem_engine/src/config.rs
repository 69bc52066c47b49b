//! Engine configuration management.
//!
//! Collects every environment variable the engine reads and validates
//! the result.

use std::str::FromStr;

use crate::{db::DatabaseConfig, room::RoomConfig};

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub room: RoomConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            database: DatabaseConfig::from_vars(&var)?,
            room: RoomConfig::from_vars(&var)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.room.validate()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse `key` from `var`, falling back to `default` when unset. A value
/// that is set but doesn't parse is an error rather than a silent
/// default.
pub(crate) fn parse_var<T, F>(var: F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("can't parse {raw:?}"),
        }),
    }
}
