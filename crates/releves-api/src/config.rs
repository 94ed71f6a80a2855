use std::collections::HashMap;
use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `SQLite` file holding the readings
    pub database_uri: String,
    /// Default window of the list route, in days
    pub list_window_days: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "RELEVES_API_BIND_ADDR", "127.0.0.1:5000");
        let database_uri = value_or_default(&lookup, "RELEVES_DATABASE_URI", "releves.sqlite");

        let list_window_days = value_or_default(&lookup, "RELEVES_LIST_WINDOW_DAYS", "30")
            .parse::<u32>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "RELEVES_LIST_WINDOW_DAYS must be an integer in [1, 3660]".to_string(),
                )
            })?;
        if !(1..=3_660).contains(&list_window_days) {
            return Err(ConfigError::Invalid(
                "RELEVES_LIST_WINDOW_DAYS must be in [1, 3660]".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            database_uri,
            list_window_days,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
