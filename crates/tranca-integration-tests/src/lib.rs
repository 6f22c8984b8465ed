//! Common test utilities for lock protocol integration testing
//!
//! Exposed as a library so every test binary shares the same tracing setup,
//! key generation and live-store wiring.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

use tranca_store::{RedisLockStore, RedisStoreConfig, StoreError};

/// Environment variable pointing live-store tests at a Redis server.
pub const REDIS_URL_ENV: &str = "TRANCA_TEST_REDIS_URL";

/// Install a test subscriber honoring `RUST_LOG`. Repeated calls are no-ops,
/// so every test can start with it unconditionally.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Generate a lock key unique to this test invocation, so parallel tests and
/// leftovers from aborted runs cannot collide on a shared server.
pub fn unique_lock_key(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}:test_{}", prefix, timestamp)
}

/// Connect a `RedisLockStore` to the server named by `TRANCA_TEST_REDIS_URL`,
/// falling back to the default local URL.
pub async fn redis_store_from_env() -> Result<RedisLockStore, StoreError> {
    let url = std::env::var(REDIS_URL_ENV)
        .unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string());

    RedisLockStore::connect(RedisStoreConfig::with_url(url)).await
}
