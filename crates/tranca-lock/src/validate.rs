//! Argument validation.
//!
//! Arguments are checked before anything is sent to the store, so an
//! invalid call fails fast and leaves no trace in shared state.

use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{LockError, Result};

/// Regex for validating lock keys
static LOCK_KEY_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-zA-Z0-9_.:/-]+$").expect("Invalid regex pattern"));

/// Maximum length for a lock key
const LOCK_KEY_MAX_LENGTH: usize = 512;

/// Shortest expiry the protocol will arm. Store expiries have millisecond
/// granularity, and a zero expiry would create a lock nobody can hold.
pub const MIN_TTL: Duration = Duration::from_millis(1);

/// Check a lock key: non-empty, bounded, and drawn from the store-safe
/// alphabet `[a-zA-Z0-9_.:/-]`.
pub fn key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(LockError::InvalidArgument("lock key is empty".to_string()));
    }

    if key.len() > LOCK_KEY_MAX_LENGTH {
        return Err(LockError::InvalidArgument(format!(
            "lock key exceeds {} bytes",
            LOCK_KEY_MAX_LENGTH
        )));
    }

    if !LOCK_KEY_REGEX.is_match(key) {
        return Err(LockError::InvalidArgument(format!(
            "lock key '{}' contains characters outside [a-zA-Z0-9_.:/-]",
            key
        )));
    }

    Ok(())
}

/// Check an owner token. Tokens are opaque; the only rule is that the empty
/// string can never denote an owner.
pub fn token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(LockError::InvalidArgument(
            "owner token is empty".to_string(),
        ));
    }

    Ok(())
}

/// Check a requested expiry against `MIN_TTL`.
pub fn ttl(ttl: Duration) -> Result<()> {
    if ttl < MIN_TTL {
        return Err(LockError::InvalidArgument(format!(
            "ttl must be at least {:?}, got {:?}",
            MIN_TTL, ttl
        )));
    }

    Ok(())
}
