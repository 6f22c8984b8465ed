//! Server-side scripts for the compare-and-act operations.
//!
//! Redis runs a script as one atomic unit, which is what keeps the
//! read-compare-write sequences below safe against interleaving writers.

use std::sync::LazyLock;

use redis::Script;

/// Delete the key only when it still holds the expected value.
/// Replies with the number of keys deleted (0 or 1).
pub static COMPARE_AND_DELETE: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end"#,
    )
});

/// Reset the key's expiry (milliseconds) only when it still holds the
/// expected value. Replies with 1 when the expiry was reset, 0 otherwise.
pub static COMPARE_AND_EXPIRE: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('pexpire', KEYS[1], ARGV[2])
else
    return 0
end"#,
    )
});
