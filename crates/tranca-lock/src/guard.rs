//! Lock guards and contention backoff.
//!
//! Guards pair a lock with a generated token and carry both through the
//! critical section. Release is always explicit: dropping a guard performs
//! no store I/O, so an abandoned lock is cleared by its expiry exactly as
//! if the holder had crashed.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

use tranca_store::LockStore;

use crate::{error::Result, manager::LockManager, token};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE: Duration = Duration::from_millis(100);
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Backoff schedule for contended acquisition.
///
/// Only clean contention is retried. Store failures are never resent here:
/// an acquire whose fate is unknown may already hold the lock, and only the
/// caller can decide what that means for its work.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total acquisition attempts before giving up. Values below 1 behave
    /// as 1.
    pub max_attempts: u32,
    /// Backoff after the first failed attempt; doubles each round.
    pub base_delay: Duration,
    /// Ceiling on any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: BACKOFF_BASE,
            max_delay: BACKOFF_MAX,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry `round` (zero-based): exponential, capped, with
    /// the lower half jittered so simultaneous contenders spread out of
    /// sync. Always at least half the capped value.
    fn delay_before(&self, round: u32) -> Duration {
        let capped = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(round))
            .min(self.max_delay);
        let half = capped / 2;
        let jitter = rand::rng().random_range(0..=half.as_millis() as u64);

        half + Duration::from_millis(jitter)
    }
}

/// A held lock: key plus the token that owns it.
///
/// Keeps a clone of the manager so the critical section can release or
/// extend without threading extra arguments around.
pub struct LockGuard<S: LockStore + ?Sized> {
    manager: LockManager<S>,
    key: String,
    token: String,
    ttl: Duration,
}

impl<S: LockStore + ?Sized> fmt::Debug for LockGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("token", &self.token)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<S: LockStore + ?Sized> LockGuard<S> {
    /// The lock key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owner token the lock record carries.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Hand the lock back. Returns `Ok(false)` when the expiry got there
    /// first, which callers of long critical sections should treat as a
    /// sign the work ran past its lease.
    pub async fn release(self) -> Result<bool> {
        self.manager.release(&self.key, &self.token).await
    }

    /// Push the expiry out another full TTL from now. Returns `Ok(false)`
    /// once the lock is lost, after which extending can never get it back.
    pub async fn extend(&self) -> Result<bool> {
        self.manager.extend(&self.key, &self.token, self.ttl).await
    }
}

impl<S: LockStore + ?Sized> LockManager<S> {
    /// Single-attempt guard acquisition under a fresh generated token.
    ///
    /// `Ok(None)` means the lock is currently held elsewhere.
    pub async fn acquire_guard(&self, key: &str, ttl: Duration) -> Result<Option<LockGuard<S>>> {
        let token = token::generate_token();

        if self.acquire(key, &token, ttl).await? {
            Ok(Some(LockGuard {
                manager: self.clone(),
                key: key.to_string(),
                token,
                ttl,
            }))
        } else {
            Ok(None)
        }
    }

    /// Guard acquisition that rides out contention with jittered
    /// exponential backoff. One token for the whole call, so a retry can
    /// never contend with its own earlier attempt.
    pub async fn acquire_guard_with_retry(
        &self,
        key: &str,
        ttl: Duration,
        policy: &RetryPolicy,
    ) -> Result<Option<LockGuard<S>>> {
        let token = token::generate_token();
        let mut attempt = 0;

        loop {
            attempt += 1;

            if self.acquire(key, &token, ttl).await? {
                return Ok(Some(LockGuard {
                    manager: self.clone(),
                    key: key.to_string(),
                    token,
                    ttl,
                }));
            }

            if attempt >= policy.max_attempts {
                debug!(
                    "lock {} still contended after {} attempts, giving up",
                    key, attempt
                );
                return Ok(None);
            }

            let delay = policy.delay_before(attempt - 1);
            debug!(
                "lock {} contended, attempt {}/{} backing off {:?}",
                key, attempt, policy.max_attempts, delay
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tokio::time::advance;
    use tranca_store::{MemoryLockStore, StoreError};

    use crate::error::LockError;

    fn manager_over_memory() -> (LockManager<MemoryLockStore>, MemoryLockStore) {
        let store = MemoryLockStore::new();
        (LockManager::new(Arc::new(store.clone())), store)
    }

    #[test]
    fn test_delay_before_stays_within_bounds() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };

        for _ in 0..32 {
            let first = policy.delay_before(0);
            assert!(first >= Duration::from_millis(50));
            assert!(first <= Duration::from_millis(100));

            // Far rounds saturate at the ceiling.
            let late = policy.delay_before(9);
            assert!(late >= Duration::from_millis(500));
            assert!(late <= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_guard_round_trip() {
        let (manager, store) = manager_over_memory();

        let guard = manager
            .acquire_guard("orders", Duration::from_millis(500))
            .await
            .unwrap()
            .expect("lock should be free");
        assert_eq!(store.value_of("orders"), Some(guard.token().to_string()));
        assert_eq!(guard.key(), "orders");

        // Held, so a second guard is refused.
        let second = manager
            .acquire_guard("orders", Duration::from_millis(500))
            .await
            .unwrap();
        assert!(second.is_none());

        assert!(guard.release().await.unwrap());
        assert_eq!(store.value_of("orders"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_debug_reports_key_and_token() {
        let (manager, _store) = manager_over_memory();

        let guard = manager
            .acquire_guard("orders", Duration::from_millis(500))
            .await
            .unwrap()
            .expect("lock should be free");

        // Guards show up in assertion failures and logs; the identifying
        // fields must be visible there.
        let rendered = format!("{:?}", guard);
        assert!(rendered.starts_with("LockGuard"));
        assert!(rendered.contains("orders"));
        assert!(rendered.contains(guard.token()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_extend_outlives_original_deadline() {
        let (manager, store) = manager_over_memory();

        let guard = manager
            .acquire_guard("orders", Duration::from_millis(100))
            .await
            .unwrap()
            .expect("lock should be free");

        advance(Duration::from_millis(60)).await;
        assert!(guard.extend().await.unwrap());

        // Past the original deadline, still held.
        advance(Duration::from_millis(60)).await;
        assert_eq!(store.value_of("orders"), Some(guard.token().to_string()));

        // Past the extended deadline, gone; extend cannot resurrect it.
        advance(Duration::from_millis(50)).await;
        assert_eq!(store.value_of("orders"), None);
        assert!(!guard.extend().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_guard_is_cleared_by_expiry() {
        let (manager, store) = manager_over_memory();

        let guard = manager
            .acquire_guard("orders", Duration::from_millis(200))
            .await
            .unwrap()
            .expect("lock should be free");
        let token = guard.token().to_string();

        // Dropping performs no store I/O; the record stays live.
        drop(guard);
        assert_eq!(store.value_of("orders"), Some(token));

        advance(Duration::from_millis(200)).await;
        assert_eq!(store.value_of("orders"), None);
        assert!(
            manager
                .acquire_guard("orders", Duration::from_millis(200))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_wins_once_holder_expires() {
        let (manager, _store) = manager_over_memory();

        manager
            .acquire("orders", "holder", Duration::from_millis(200))
            .await
            .unwrap();

        // Backoff rounds are at least 100ms each, so the holder's 200ms
        // lease lapses within the five attempts.
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(200),
        };
        let guard = manager
            .acquire_guard_with_retry("orders", Duration::from_millis(500), &policy)
            .await
            .unwrap();

        assert!(guard.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_while_lock_is_held() {
        let (manager, store) = manager_over_memory();

        manager
            .acquire("orders", "holder", Duration::from_secs(60))
            .await
            .unwrap();

        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        };
        let guard = manager
            .acquire_guard_with_retry("orders", Duration::from_secs(1), &policy)
            .await
            .unwrap();

        assert!(guard.is_none());
        assert_eq!(store.value_of("orders"), Some("holder".to_string()));
    }

    #[derive(Default)]
    struct FailingStore {
        calls: AtomicU32,
    }

    #[async_trait]
    impl tranca_store::LockStore for FailingStore {
        async fn set_if_absent_with_expiry(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> Result<bool, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Connection("store is down".to_string()))
        }

        async fn compare_and_delete(
            &self,
            _key: &str,
            _expected: &str,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Connection("store is down".to_string()))
        }

        async fn compare_and_expire(
            &self,
            _key: &str,
            _expected: &str,
            _ttl: Duration,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Connection("store is down".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_stops_retry_immediately() {
        let store = Arc::new(FailingStore::default());
        let manager = LockManager::new(store.clone());

        let result = manager
            .acquire_guard_with_retry("orders", Duration::from_secs(1), &RetryPolicy::default())
            .await;

        let err = result.expect_err("store is down");
        assert!(matches!(err, LockError::Store(_)));
        assert!(err.is_indeterminate());

        // No blind resend of an acquire whose outcome is unknown.
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
