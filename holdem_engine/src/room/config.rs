//! Room configuration.

use serde::{Deserialize, Serialize};

use crate::{
    config::{ConfigError, parse_var},
    game::constants::MAX_PLAYERS,
};

/// Settings applied to every room the service opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seats per room (default: 7)
    pub room_limit: usize,
}

impl RoomConfig {
    /// Read `ROOM_LIMIT` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            room_limit: parse_var(&var, "ROOM_LIMIT", MAX_PLAYERS)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_PLAYERS).contains(&self.room_limit) {
            return Err(ConfigError::Invalid {
                var: "ROOM_LIMIT".to_string(),
                reason: format!("Must be between 2 and {MAX_PLAYERS}"),
            });
        }
        Ok(())
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_limit: MAX_PLAYERS,
        }
    }
}
