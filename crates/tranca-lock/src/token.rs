//! Owner token generation.

use uuid::Uuid;

/// Generate a fresh owner token.
///
/// A token only has to be unique among contenders for the same key within a
/// TTL window; a v4 UUID clears that bar without coordination. Callers with
/// their own identity scheme can pass any non-empty string instead.
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}
