//! Bounded retry with exponential backoff for transient fetch failures.

use std::future::Future;
use std::time::Duration;

use chip_common::{ChipError, ChipResult};
use tracing::warn;

/// Retry policy for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial try.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt.
    pub initial_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or retries are exhausted.
///
/// Only errors reporting themselves retryable ([`ChipError::is_retryable`])
/// are retried; a permanent failure (404, auth) is surfaced immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> ChipResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChipResult<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    what = %what,
                    error = %e,
                    retry = attempt,
                    max_retries = policy.max_retries,
                    delay_secs = delay.as_secs(),
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, policy.max_delay);
            }
            Err(e) if e.is_retryable() => {
                return Err(ChipError::fetch_permanent(format!(
                    "{} failed after {} retries: {}",
                    what, attempt, e
                )));
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(&fast_policy(5), "test", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(ChipError::fetch_transient("timeout"))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        // Three failures then one success.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let err = retry_with_backoff(&fast_policy(5), "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ChipError::fetch_permanent("404 Not Found")) }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn exhausting_retries_surfaces_permanent_error() {
        let attempts = AtomicU32::new(0);
        let err = retry_with_backoff(&fast_policy(3), "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ChipError::fetch_transient("503")) }
        })
        .await
        .unwrap_err();

        // Initial try plus exactly the configured number of retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert!(matches!(err, ChipError::Fetch { retryable: false, .. }));
    }
}
