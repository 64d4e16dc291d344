//! Retry with backoff
//!
//! One implementation for the two places the portal waits out contention:
//! HTTP callers receiving 429 / "Too Many Requests" from the portal, and
//! database writes hitting "database is locked".
//!
//! **Backoff:** `base * 2^(attempt-1)`, capped at `max_delay_ms`, plus up to
//! `jitter_ms` of random spread.

use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Attempt budget and delay curve for a retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl RetryPolicy {
    /// Rate-limited HTTP calls: 3 attempts waiting 1s, 2s (4s cap)
    pub const fn http_rate_limit() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 4000,
            jitter_ms: 0,
        }
    }

    /// Locked SQLite writes: 10ms doubling up to 1s, 10 attempts
    pub const fn database_lock() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 10,
            max_delay_ms: 1000,
            jitter_ms: 5,
        }
    }

    /// Delay before retry number `attempt` (1 = first retry), without jitter
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Delay before retry number `attempt`, jitter included
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        self.base_delay_for(attempt) + Duration::from_millis(jitter)
    }
}

/// Does an error message indicate throttling?
///
/// Throttled upstreams sometimes answer with a plain-text "Too Many Requests"
/// body, which surfaces as a JSON parse failure; those count too.
pub fn is_rate_limit_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    msg.contains("Too Many R")
        || lower.contains("rate limit")
        || lower.contains("too many requests")
        || msg.contains("Unexpected token")
        || msg.contains("is not valid JSON")
        || msg.contains("SyntaxError")
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or the
/// attempt budget runs out. The last error is returned on exhaustion.
pub async fn retry_with_backoff<F, Fut, T, E>(
    label: &str,
    policy: RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let start_time = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = label,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    return Err(err);
                }
                if attempt >= policy.max_attempts {
                    tracing::error!(
                        operation = label,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        error = %err,
                        "Giving up: retry budget exhausted"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retry a database operation while SQLite reports the database as locked.
///
/// Exhaustion is reported as [`Error::RateLimited`] so callers can answer 429.
pub async fn retry_on_lock<F, Fut, T>(label: &str, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match retry_with_backoff(label, RetryPolicy::database_lock(), Error::is_database_locked, operation).await {
        Err(err) if err.is_database_locked() => Err(Error::RateLimited(format!("{}: {}", label, err))),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter_ms: 0,
        }
    }

    #[test]
    fn test_http_delays_double() {
        let policy = RetryPolicy::http_rate_limit();
        assert_eq!(policy.base_delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.base_delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.base_delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.base_delay_for(9), Duration::from_millis(4000));
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        let policy = RetryPolicy::database_lock();
        for attempt in 1..8 {
            let delay = policy.delay_for(attempt);
            let base = policy.base_delay_for(attempt);
            assert!(delay >= base && delay <= base + Duration::from_millis(policy.jitter_ms));
        }
    }

    #[test]
    fn test_rate_limit_messages() {
        assert!(is_rate_limit_message("Too Many Requests"));
        assert!(is_rate_limit_message("Too Many R"));
        assert!(is_rate_limit_message("API rate limit reached"));
        assert!(is_rate_limit_message("Unexpected token 'T', \"Too Many R\"... is not valid JSON"));
        assert!(!is_rate_limit_message("relation \"students\" does not exist"));
    }

    #[tokio::test]
    async fn test_succeeds_after_retryable_failures() {
        let calls = Cell::new(0);
        let result: std::result::Result<i32, String> = retry_with_backoff(
            "test_op",
            fast_policy(3),
            |e: &String| is_rate_limit_message(e),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err("Too Many Requests".to_string())
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = Cell::new(0);
        let result: std::result::Result<i32, String> = retry_with_backoff(
            "test_op",
            fast_policy(5),
            |e: &String| is_rate_limit_message(e),
            || {
                calls.set(calls.get() + 1);
                async { Err("constraint failed".to_string()) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_budget_exhausted_returns_last_error() {
        let calls = Cell::new(0);
        let result: std::result::Result<i32, String> = retry_with_backoff(
            "test_op",
            fast_policy(2),
            |_: &String| true,
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Err(format!("attempt {}", n)) }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), "attempt 2");
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_retry_on_lock_passes_other_errors_through() {
        let result: Result<i32> =
            retry_on_lock("test_op", || async { Err(Error::InvalidInput("bad".into())) }).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
