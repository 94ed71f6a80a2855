//! Client configuration.
//!
//! Values come from a lookup function (environment variables in practice) so
//! parsing stays testable without touching the process environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

/// Storage key under which the entry collection is kept.
pub const DEFAULT_STORAGE_KEY: &str = "Releves.RelevesList";
/// Trailing window pulled from the server on refresh.
pub const DEFAULT_REFRESH_WINDOW_DAYS: u32 = 30;
/// Bound on every gateway call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

const DEFAULT_DB_FILE: &str = "releves.db";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the releves server, `None` when running offline-only
    pub server_url: Option<String>,
    pub storage_key: String,
    pub request_timeout: Duration,
    pub refresh_window_days: u32,
    /// Local database file
    pub db_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_window_days: DEFAULT_REFRESH_WINDOW_DAYS,
            db_path: default_db_path(),
        }
    }
}

impl ClientConfig {
    /// Build the configuration from `RELEVES_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server_url = normalize_server_url(lookup("RELEVES_SERVER_URL"))?;

        let storage_key = normalize_text_option(lookup("RELEVES_STORAGE_KEY"))
            .unwrap_or(defaults.storage_key);

        let request_timeout = match normalize_text_option(lookup("RELEVES_TIMEOUT_MS")) {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|_| {
                    ConfigError::Invalid(format!("RELEVES_TIMEOUT_MS must be an integer: {raw}"))
                })?;
                if millis == 0 {
                    return Err(ConfigError::Invalid(
                        "RELEVES_TIMEOUT_MS must be greater than 0".to_string(),
                    ));
                }
                Duration::from_millis(millis)
            }
            None => defaults.request_timeout,
        };

        let refresh_window_days = match normalize_text_option(lookup("RELEVES_REFRESH_DAYS")) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "RELEVES_REFRESH_DAYS must be a positive integer: {raw}"
                    ))
                })?,
            None => defaults.refresh_window_days,
        };

        let db_path = normalize_text_option(lookup("RELEVES_DB_PATH"))
            .map_or(defaults.db_path, PathBuf::from);

        Ok(Self {
            server_url,
            storage_key,
            request_timeout,
            refresh_window_days,
            db_path,
        })
    }

    /// Override the server URL (e.g. from a command-line flag).
    pub fn with_server_url(mut self, server_url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = normalize_server_url(server_url)? {
            self.server_url = Some(url);
        }
        Ok(self)
    }
}

/// Default location of the local database.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("releves")
        .join(DEFAULT_DB_FILE)
}

fn normalize_server_url(raw: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(url) = normalize_text_option(raw) else {
        return Ok(None);
    };
    if is_http_url(&url) {
        Ok(Some(url.trim_end_matches('/').to_string()))
    } else {
        Err(ConfigError::Invalid(format!(
            "server URL must include http:// or https://: {url}"
        )))
    }
}
