//! Store error taxonomy.

use thiserror::Error;

/// Faults raised by a `LockStore` backend.
///
/// Every variant describes a failed conversation with the store, never a
/// protocol outcome: contention and ownership mismatches are ordinary `Ok`
/// replies at this seam. A caller seeing `StoreError` cannot know whether
/// the store applied the operation before the conversation broke down.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached, refused the connection, or dropped it
    /// mid-call.
    #[error("store connection failure: {0}")]
    Connection(String),

    /// The call did not complete within the configured deadline.
    #[error("store timeout: {0}")]
    Timeout(String),

    /// The store replied with something the backend cannot interpret.
    #[error("store protocol failure: {0}")]
    Protocol(String),

    /// The backend was handed unusable settings.
    #[error("store configuration error: {0}")]
    Config(String),
}
