//! In-process lock store.
//!
//! Backs tests and single-process callers with the same atomicity and
//! expiry semantics as the Redis store. Time comes from `tokio::time`, so
//! paused-clock tests can step expiry deterministically.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;

use crate::{LockStore, error::StoreError};

struct StoredRecord {
    value: String,
    expires_at: Instant,
}

impl StoredRecord {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// `LockStore` held entirely in process memory.
///
/// Expiry is lazy: a record past its deadline counts as absent for every
/// operation and is overwritten by the next set. Clones share the
/// underlying map.
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    records: Arc<DashMap<String, StoredRecord>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live value under `key`, if any.
    pub fn value_of(&self, key: &str) -> Option<String> {
        self.records
            .get(key)
            .filter(|record| !record.is_expired())
            .map(|record| record.value.clone())
    }

    /// Time left before the record under `key` expires.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        self.records
            .get(key)
            .filter(|record| !record.is_expired())
            .map(|record| record.expires_at.saturating_duration_since(Instant::now()))
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        // The entry keeps its shard locked, so the check and the insert
        // cannot interleave with another writer.
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) if occupied.get().is_expired() => {
                occupied.insert(StoredRecord::new(value, ttl));
                Ok(true)
            }
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(StoredRecord::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<u64, StoreError> {
        let removed = self
            .records
            .remove_if(key, |_, record| {
                !record.is_expired() && record.value == expected
            });

        Ok(if removed.is_some() { 1 } else { 0 })
    }

    async fn compare_and_expire(
        &self,
        key: &str,
        expected: &str,
        ttl: Duration,
    ) -> Result<u64, StoreError> {
        match self.records.get_mut(key) {
            Some(mut record) if !record.is_expired() && record.value == expected => {
                record.expires_at = Instant::now() + ttl;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
