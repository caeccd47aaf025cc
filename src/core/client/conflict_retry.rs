use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::core::client::error_classifier::ReplicaStoreError;

pub const DEFAULT_CONFLICT_ATTEMPTS: u32 = 3;
pub const DEFAULT_CONFLICT_BACKOFF: Duration = Duration::from_millis(50);

/// How often a read-modify-write cycle is repeated after losing an
/// optimistic-concurrency race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRetryPolicy {
    /// Total attempts, including the first one. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Base delay; the wait after attempt `n` is `n * backoff`.
    pub backoff: Duration,
}

impl Default for ConflictRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CONFLICT_ATTEMPTS,
            backoff: DEFAULT_CONFLICT_BACKOFF,
        }
    }
}

impl ConflictRetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Run `op` until it stops returning [`ReplicaStoreError::Conflict`] or the
/// attempts are used up. Each call of `op` must perform a full fresh read
/// before writing.
pub async fn retry_on_conflict<T, F, Fut>(
    policy: ConflictRetryPolicy,
    mut op: F,
) -> Result<T, ReplicaStoreError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ReplicaStoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Err(err) if err.is_conflict() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "write conflict, retrying: {}",
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
