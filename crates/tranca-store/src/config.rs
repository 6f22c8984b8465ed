//! Redis store configuration
//!
//! Settings are layered from an optional `conf/tranca` file and
//! `TRANCA_STORE_*` environment variables, with environment taking
//! precedence.

use std::time::Duration;

use config::{Config, Environment};

use crate::error::StoreError;

const CONFIG_FILE: &str = "conf/tranca";
const ENV_PREFIX: &str = "TRANCA_STORE";

const DEFAULT_URL: &str = "redis://127.0.0.1:6379/";
const DEFAULT_KEY_PREFIX: &str = "tranca:lock:";
const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_NUMBER_OF_RETRIES: usize = 3;

/// Connection settings for `RedisLockStore`.
#[derive(Clone, Debug)]
pub struct RedisStoreConfig {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379/`.
    pub url: String,
    /// Prefix prepended to every lock key before it reaches the store.
    pub key_prefix: String,
    /// Deadline for establishing a connection.
    pub connection_timeout: Duration,
    /// Deadline for each command round trip.
    pub response_timeout: Duration,
    /// Reconnect attempts the connection manager makes before a command
    /// round trip is reported as failed.
    pub number_of_retries: usize,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            connection_timeout: Duration::from_millis(DEFAULT_CONNECTION_TIMEOUT_MS),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            number_of_retries: DEFAULT_NUMBER_OF_RETRIES,
        }
    }
}

impl RedisStoreConfig {
    /// Shorthand for a config pointing at `url` with every other field at
    /// its default.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load settings from `conf/tranca` (any supported format, optional)
    /// overlaid with `TRANCA_STORE_URL`, `TRANCA_STORE_KEY_PREFIX`,
    /// `TRANCA_STORE_CONNECTION_TIMEOUT_MS`, `TRANCA_STORE_RESPONSE_TIMEOUT_MS`
    /// and `TRANCA_STORE_NUMBER_OF_RETRIES`.
    pub fn from_env() -> Result<Self, StoreError> {
        let settings = Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to load store settings: {}", e)))?;

        Ok(Self {
            url: settings.get_string("url").unwrap_or(DEFAULT_URL.to_string()),
            key_prefix: settings
                .get_string("key_prefix")
                .unwrap_or(DEFAULT_KEY_PREFIX.to_string()),
            connection_timeout: Duration::from_millis(
                settings
                    .get_int("connection_timeout_ms")
                    .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_MS as i64) as u64,
            ),
            response_timeout: Duration::from_millis(
                settings
                    .get_int("response_timeout_ms")
                    .unwrap_or(DEFAULT_RESPONSE_TIMEOUT_MS as i64) as u64,
            ),
            number_of_retries: settings
                .get_int("number_of_retries")
                .unwrap_or(DEFAULT_NUMBER_OF_RETRIES as i64) as usize,
        })
    }
}
