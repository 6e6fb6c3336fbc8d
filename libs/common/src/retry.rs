//! Bounded retry with exponential backoff for backend calls

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};

/// Retry policy applied to backend fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Timeout of a single attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on the delay between retries
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn once(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `attempt` (zero based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `operation`, retrying retryable failures according to `policy`
///
/// Each attempt is bounded by `policy.timeout`; an expired attempt counts as
/// a retryable [`BackendError::Timeout`].
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt_fn: F,
) -> BackendResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BackendResult<T>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, attempt_fn()).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(policy.timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                debug!(
                    "{} failed ({}), retry {}/{} after {:?}",
                    operation,
                    e,
                    attempt + 1,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{} failed after {} attempt(s): {}", operation, attempt + 1, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(200),
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_backoff_progression_is_capped() {
        let policy = RetryPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };

        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(350));
        assert_eq!(policy.backoff(31), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast_policy(3), "fetch staff", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::Transport("connection reset".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_definitive_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: BackendResult<()> = with_retry(&fast_policy(3), "fetch staff", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::NotFound("staff-9".into()))
            }
        })
        .await;

        assert_eq!(result, Err(BackendError::NotFound("staff-9".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_times_out_slow_attempts() {
        let policy = RetryPolicy {
            timeout: Duration::from_millis(10),
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };

        let result: BackendResult<()> = with_retry(&policy, "fetch permissions", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(BackendError::Timeout(Duration::from_millis(10))));
    }
}
