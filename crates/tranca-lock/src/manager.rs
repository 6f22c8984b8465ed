//! Lock manager
//!
//! The manager is a thin, stateless coordinator: every decision is made by
//! one atomic operation at the store, and nothing about held locks is
//! cached in process. Two managers over the same store, or two hundred
//! spread across a fleet, observe exactly the same state.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use tranca_store::LockStore;

use crate::{error::Result, validate};

/// Coordinator for named locks over a shared store.
///
/// Generic over any `LockStore`, including trait objects
/// (`LockManager<dyn LockStore>`). Clones are cheap and share the store
/// handle.
pub struct LockManager<S: LockStore + ?Sized> {
    store: Arc<S>,
}

impl<S: LockStore + ?Sized> Clone for LockManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LockStore + ?Sized> LockManager<S> {
    /// Create a manager over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Try to take lock `key` for `token`, good for `ttl`.
    ///
    /// Returns `Ok(true)` when this call created the lock record and
    /// `Ok(false)` when a live record already exists. One attempt, no
    /// waiting: contenders decide their own retry cadence. On
    /// `Err(LockError::Store)` the record may or may not have been
    /// written; if it was, its expiry clears it.
    pub async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        validate::key(key)?;
        validate::token(token)?;
        validate::ttl(ttl)?;

        let acquired = self
            .store
            .set_if_absent_with_expiry(key, token, ttl)
            .await?;

        if acquired {
            debug!("lock {} acquired by {} for {:?}", key, token, ttl);
        } else {
            debug!("lock {} contended, not acquired by {}", key, token);
        }

        Ok(acquired)
    }

    /// Release lock `key` if `token` still owns it.
    ///
    /// Returns `Ok(true)` when the record was deleted and `Ok(false)` when
    /// it was already gone or belongs to another owner. The compare and the
    /// delete run as one unit at the store, so a slow releaser can never
    /// destroy a lock that expired and changed hands under it.
    pub async fn release(&self, key: &str, token: &str) -> Result<bool> {
        validate::key(key)?;
        validate::token(token)?;

        let deleted = self.store.compare_and_delete(key, token).await?;

        // The store answers with the number of records the delete removed.
        // Exactly one means the caller's record; zero means expiry or
        // another owner.
        let released = deleted == 1;

        if released {
            debug!("lock {} released by {}", key, token);
        } else {
            debug!("lock {} not owned by {}, release skipped", key, token);
        }

        Ok(released)
    }

    /// Push the expiry of lock `key` out to `ttl` from now if `token`
    /// still owns it.
    ///
    /// Returns `Ok(false)` when the record is gone or foreign, in which
    /// case the caller has already lost the lock and must stop relying
    /// on it.
    pub async fn extend(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        validate::key(key)?;
        validate::token(token)?;
        validate::ttl(ttl)?;

        let touched = self.store.compare_and_expire(key, token, ttl).await?;
        let extended = touched == 1;

        if extended {
            debug!("lock {} extended by {} for {:?}", key, token, ttl);
        } else {
            debug!("lock {} not owned by {}, extend skipped", key, token);
        }

        Ok(extended)
    }
}
