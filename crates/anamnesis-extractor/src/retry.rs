//! Bounded retry with a fixed delay
//!
//! Used identically by the extraction pass and the HDA rewrite pass. There is
//! no backoff growth and no jitter: every retryable failure waits the same
//! `delay`, and no sleep happens after the final attempt.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is raised to at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(3))
    }
}

/// Why [`retry`] gave up
#[derive(Debug, Clone, PartialEq)]
pub enum RetryFailure<E> {
    /// A non-retryable error on the given attempt
    Terminal {
        /// 1-based attempt number
        attempt: u32,
        /// The error
        error: E,
    },

    /// Every attempt failed with a retryable error
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// The last error seen
        last: E,
    },
}

/// Run `operation` until it succeeds, fails terminally, or the budget runs out.
///
/// `operation` receives the 1-based attempt number. On success returns the
/// value and the attempt that produced it.
pub async fn retry<T, E, F, Fut, R>(
    policy: RetryPolicy,
    is_retryable: R,
    mut operation: F,
) -> Result<(T, u32), RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(error) if !is_retryable(&error) => {
                return Err(RetryFailure::Terminal { attempt, error });
            }
            Err(error) if attempt >= policy.max_attempts => {
                return Err(RetryFailure::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    "Retryable failure: {}",
                    error
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_first_success() {
        let result = retry(instant(3), |_: &String| true, |attempt| async move {
            Ok::<_, String>(attempt * 10)
        })
        .await;
        assert_eq!(result, Ok((10, 1)));
    }

    #[tokio::test]
    async fn test_succeeds_after_retries() {
        let calls = Cell::new(0);
        let result = retry(instant(3), |_: &String| true, |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 3 {
                    Err("busy".to_string())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result, Ok(("done", 3)));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_stops_at_bound() {
        let calls = Cell::new(0);
        let result: Result<((), u32), _> = retry(instant(4), |_: &String| true, |_| {
            calls.set(calls.get() + 1);
            async { Err("busy".to_string()) }
        })
        .await;
        assert_eq!(
            result,
            Err(RetryFailure::Exhausted {
                attempts: 4,
                last: "busy".to_string()
            })
        );
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_terminal_error_stops_immediately() {
        let calls = Cell::new(0);
        let result: Result<((), u32), _> =
            retry(instant(3), |e: &String| e == "busy", |_| {
                calls.set(calls.get() + 1);
                async { Err("denied".to_string()) }
            })
            .await;
        assert_eq!(
            result,
            Err(RetryFailure::Terminal {
                attempt: 1,
                error: "denied".to_string()
            })
        );
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_delay_applies_between_attempts_only() {
        let policy = RetryPolicy::new(2, Duration::from_millis(20));
        let start = std::time::Instant::now();
        let result: Result<((), u32), _> =
            retry(policy, |_: &String| true, |_| async { Err("busy".to_string()) }).await;
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(RetryFailure::Exhausted { attempts: 2, .. })));
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(1_000));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
