//! Lock error taxonomy.

use thiserror::Error;
use tranca_store::StoreError;

/// Result alias used across the lock crate.
pub type Result<T, E = LockError> = core::result::Result<T, E>;

/// Failures surfaced by lock operations.
///
/// Contention and ownership mismatches are not errors. They come back as
/// `Ok(false)` because the store answered cleanly and the answer was no.
/// The variants here cover the cases where no clean answer exists.
#[derive(Error, Debug)]
pub enum LockError {
    /// The caller handed over arguments the protocol refuses to send to
    /// the store. Nothing was attempted against the store.
    #[error("invalid lock argument: {0}")]
    InvalidArgument(String),

    /// The conversation with the store broke down. The operation may or
    /// may not have been applied.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl LockError {
    /// True when the outcome at the store is unknown.
    ///
    /// An acquire that failed this way may still have written a record;
    /// such a record clears itself once its expiry lapses. A release that
    /// failed this way is safe to resend, since deleting is conditioned on
    /// ownership at the store.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, LockError::Store(_))
    }
}
