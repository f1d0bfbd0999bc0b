//! Retry logic for platform requests
//!
//! Implements capped exponential backoff for transient failures and rate
//! limiting.
//!
//! **Backoff Strategy:**
//! - Initial delay: `RetryPolicy::initial_backoff`
//! - Multiplier: 2.0 (exponential)
//! - Every delay is capped at `RetryPolicy::max_backoff`
//! - A server-provided retry hint replaces the computed delay, still capped
//!
//! Non-retryable errors are returned immediately.

use std::time::{Duration, Instant};

/// Errors that may succeed on a later attempt
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Delay requested by the server, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Retry limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Retry an operation with exponential backoff
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is retryable and retries remain: log WARN, back off, retry
/// 4. Otherwise return the error
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "GET /users/octocat")
/// * `policy` - Retry limits
/// * `operation` - Async closure performing one attempt
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start_time = Instant::now();
    let mut attempt = 0u32;
    let mut backoff = policy.initial_backoff;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }

                if attempt > policy.max_retries {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        error = %err,
                        "Request failed: retries exhausted"
                    );
                    return Err(err);
                }

                let delay = err.retry_after().unwrap_or(backoff).min(policy.max_backoff);

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = delay.as_millis(),
                    error = %err,
                    "Request failed, will retry after backoff"
                );

                tokio::time::sleep(delay).await;

                backoff = (backoff * 2).min(policy.max_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Busy(Option<Duration>),
        Fatal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Busy(_))
        }

        fn retry_after(&self) -> Option<Duration> {
            match self {
                TestError::Busy(hint) => *hint,
                TestError::Fatal => None,
            }
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_with_backoff("test_op", &fast_policy(3), || async {
            Ok::<i32, TestError>(42)
        })
        .await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_errors() {
        let mut attempts = 0;

        let result = retry_with_backoff("test_op", &fast_policy(3), || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(TestError::Busy(None))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let mut attempts = 0;

        let result = retry_with_backoff("test_op", &fast_policy(2), || {
            attempts += 1;
            async { Err::<i32, TestError>(TestError::Busy(None)) }
        })
        .await;

        assert_eq!(result, Err(TestError::Busy(None)));
        assert_eq!(attempts, 3); // first attempt + 2 retries
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let mut attempts = 0;

        let result = retry_with_backoff("test_op", &fast_policy(5), || {
            attempts += 1;
            async { Err::<i32, TestError>(TestError::Fatal) }
        })
        .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(attempts, 1); // Should not retry
    }

    #[tokio::test]
    async fn test_retry_after_hint_is_capped() {
        let start = Instant::now();
        let mut attempts = 0;

        let result = retry_with_backoff("test_op", &fast_policy(1), || {
            attempts += 1;
            let current = attempts;
            async move {
                if current == 1 {
                    Err(TestError::Busy(Some(Duration::from_secs(3600))))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
