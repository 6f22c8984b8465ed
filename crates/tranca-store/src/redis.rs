//! Redis-backed lock store.
//!
//! Each trait operation is a single round trip: acquisition rides on
//! `SET key value NX PX ttl`, and the conditional release/extend paths run
//! as server-side scripts so the compare and the write cannot interleave
//! with another client.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::{debug, info};

use crate::{LockStore, config::RedisStoreConfig, error::StoreError, scripts};

/// Reply Redis sends when a conditional `SET` actually wrote the key.
const SET_OK: &str = "OK";

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_timeout() {
            StoreError::Timeout(e.to_string())
        } else if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Protocol(e.to_string())
        }
    }
}

/// `LockStore` backed by a Redis server.
///
/// Wraps a multiplexed connection that reconnects on failure; commands
/// issued while the server is unreachable fail with `StoreError` instead of
/// blocking until recovery. Clones are cheap and share the connection.
#[derive(Clone)]
pub struct RedisLockStore {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisLockStore {
    /// Connect to the Redis server described by `config`.
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| StoreError::Config(format!("invalid redis url: {}", e)))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connection_timeout)
            .set_response_timeout(config.response_timeout)
            .set_number_of_retries(config.number_of_retries);

        let connection = client
            .get_connection_manager_with_config(manager_config)
            .await?;

        info!("connected to redis lock store, key prefix {}", config.key_prefix);

        Ok(Self {
            connection,
            key_prefix: config.key_prefix,
        })
    }

    /// Connect using `RedisStoreConfig::from_env()`.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::connect(RedisStoreConfig::from_env()?).await
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let storage_key = self.storage_key(key);
        let mut connection = self.connection.clone();

        // NX and PX together make creation and expiry one indivisible write.
        // Redis replies OK when the key was written and Nil when a live
        // value was already present.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&storage_key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut connection)
            .await?;

        let created = matches!(reply.as_deref(), Some(SET_OK));
        debug!("set_if_absent key={} created={}", storage_key, created);

        Ok(created)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<u64, StoreError> {
        let storage_key = self.storage_key(key);
        let mut connection = self.connection.clone();

        let deleted: u64 = scripts::COMPARE_AND_DELETE
            .key(&storage_key)
            .arg(expected)
            .invoke_async(&mut connection)
            .await?;

        debug!("compare_and_delete key={} deleted={}", storage_key, deleted);

        Ok(deleted)
    }

    async fn compare_and_expire(
        &self,
        key: &str,
        expected: &str,
        ttl: Duration,
    ) -> Result<u64, StoreError> {
        let storage_key = self.storage_key(key);
        let mut connection = self.connection.clone();

        let touched: u64 = scripts::COMPARE_AND_EXPIRE
            .key(&storage_key)
            .arg(expected)
            .arg(ttl.as_millis() as u64)
            .invoke_async(&mut connection)
            .await?;

        debug!("compare_and_expire key={} touched={}", storage_key, touched);

        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    #[test]
    fn test_timeout_errors_map_to_timeout() {
        let source = io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed");
        let err = StoreError::from(redis::RedisError::from(source));

        assert!(matches!(err, StoreError::Timeout(_)));
    }

    #[test]
    fn test_io_errors_map_to_connection() {
        let source = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = StoreError::from(redis::RedisError::from(source));

        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn test_server_errors_map_to_protocol() {
        let err = StoreError::from(redis::RedisError::from((
            redis::ErrorKind::ResponseError,
            "unexpected reply",
        )));

        assert!(matches!(err, StoreError::Protocol(_)));
    }
}
