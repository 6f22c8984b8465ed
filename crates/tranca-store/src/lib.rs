//! Tranca Store - key-value store backends for the lock protocol
//!
//! This crate provides the store side of the Tranca distributed lock:
//! - `LockStore`: the atomic operations the protocol requires from a store
//! - `RedisLockStore`: Redis backend (`SET NX PX` + server-side Lua scripts)
//! - `MemoryLockStore`: in-process backend honoring the same atomicity and
//!   expiry semantics, intended for tests and single-process use
//! - `RedisStoreConfig`: connection settings with file/env layering

pub mod config;
pub mod error;
pub mod memory;
pub mod redis;

mod scripts;

// Re-exports for convenience
pub use config::RedisStoreConfig;
pub use error::StoreError;
pub use memory::MemoryLockStore;
pub use redis::RedisLockStore;

use std::time::Duration;

use async_trait::async_trait;

/// Atomic primitives a key-value store must expose to host lock records.
///
/// Every method is a single indivisible operation at the store. Splitting any
/// of them into a client-side read-then-write pair reopens the race windows
/// the lock protocol exists to close: a set followed by a separate expire can
/// crash in between and leave an immortal record, and a read followed by a
/// separate delete can destroy a record that changed owners in between.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Create `key → value` with the given expiry, only if `key` holds no
    /// live value. Returns `true` when the record was newly created and
    /// `false` when the key already existed (the store's no-op status).
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Delete `key` only if its current value equals `expected`. Returns the
    /// number of records deleted (0 or 1), the store's own reply type for a
    /// deletion.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<u64, StoreError>;

    /// Reset the expiry of `key` to `ttl` only if its current value equals
    /// `expected`. Returns the number of records touched (0 or 1).
    async fn compare_and_expire(
        &self,
        key: &str,
        expected: &str,
        ttl: Duration,
    ) -> Result<u64, StoreError>;
}
