//! Bounded exponential-backoff retry for calls to external services.
//!
//! Used on the instant-matching path, where a user is waiting on the
//! similarity service. Background passes do not retry; they defer to the
//! next cycle instead.

use std::future::Future;
use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

/// Run `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// Returns the last error when every attempt fails.
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff_if(operation_name, policy, |_| true, operation).await
}

/// Like [`retry_with_backoff`], but only errors for which `should_retry`
/// returns `true` are retried. Any other error is returned immediately.
pub async fn retry_with_backoff_if<F, Fut, T, E, P>(
    operation_name: &str,
    policy: &RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < attempts && should_retry(&e) => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, policy);
            }
            Err(e) => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %e,
                    "Giving up"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    #[test]
    fn next_delay_doubles_and_clamps() {
        let policy = RetryPolicy::default();
        assert_eq!(
            next_delay(Duration::from_millis(500), &policy),
            Duration::from_secs(1)
        );
        assert_eq!(next_delay(Duration::from_secs(4), &policy), policy.max_delay);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff("test", &fast_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("attempt {n} failed"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff("test", &fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;
        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff_if(
            "test",
            &fast_policy(),
            |e: &String| e.starts_with("transient"),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request".to_string()) }
            },
        )
        .await;
        assert_eq!(result, Err("bad request".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
