//! Tranca - distributed mutual exclusion over a shared key-value store
//!
//! A lock is one record in the store: `key → owner token`, armed with an
//! expiry. Acquisition is a single set-if-absent write, release is a single
//! compare-and-delete, and the expiry guarantees a crashed holder frees the
//! lock without anyone's help. The manager keeps no state of its own, so
//! any number of processes coordinate through nothing but the store.
//!
//! Guarantees, and their limits:
//! - Mutual exclusion: at most one live owner per key at any instant.
//! - Deadlock freedom: every record expires, so an abandoned lock frees
//!   itself within one TTL.
//! - Owner-only release: releasing without ownership is a no-op, enforced
//!   at the store rather than trusted to callers.
//! - A critical section that outruns its TTL loses the lock silently;
//!   `extend` pushes the deadline out for work that can run long.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tranca_lock::LockManager;
//! use tranca_store::MemoryLockStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tranca_lock::Result<()> {
//! let manager = LockManager::new(Arc::new(MemoryLockStore::new()));
//!
//! if manager
//!     .acquire("orders:eu", "worker-17", Duration::from_secs(30))
//!     .await?
//! {
//!     // ... the work the lock protects ...
//!     manager.release("orders:eu", "worker-17").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod guard;
pub mod manager;
pub mod token;
pub mod validate;

// Re-exports for convenience
pub use error::{LockError, Result};
pub use guard::{LockGuard, RetryPolicy};
pub use manager::LockManager;
pub use token::generate_token;
pub use validate::MIN_TTL;
