//! Bounded retry with configurable backoff
//!
//! The only thing Black Road ever retries is the Vault status poll, but the
//! policy is a first-class value so callers (and tests) can tune attempt
//! counts and delays instead of relying on a hardcoded loop.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// How the delay between attempts grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Retry immediately
    None,
    /// Same delay between every attempt
    #[default]
    FixedDelay,
    /// Delay doubles (by `backoff_multiplier`) each attempt
    ExponentialBackoff,
    /// Delay grows by `initial_delay` each attempt
    LinearBackoff,
}

/// A bounded retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub strategy: RetryStrategy,
    /// Base delay between attempts
    pub initial_delay: Duration,
    /// Cap applied after backoff growth
    pub max_delay: Duration,
    /// Growth factor for `ExponentialBackoff`
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            strategy: RetryStrategy::ExponentialBackoff,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Fixed delay between a bounded number of attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            strategy: RetryStrategy::FixedDelay,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }
}

/// Delay before the attempt following `attempt` (1-indexed)
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base = match policy.strategy {
        RetryStrategy::None => Duration::ZERO,
        RetryStrategy::FixedDelay => policy.initial_delay,
        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powi(attempt_index as i32);
            policy.initial_delay.mul_f64(multiplier)
        }
        RetryStrategy::LinearBackoff => policy.initial_delay * (attempt_index + 1),
    };

    base.min(policy.max_delay)
}

/// All attempts failed; carries the error from the final one
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub source: E,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "retry exhausted after {} attempts: {}",
            self.attempts, self.source
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Execute an async operation under a retry policy
///
/// Returns the first success, or `RetryExhausted` wrapping the final
/// attempt's error once the policy's attempt budget is spent.
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(source) if attempt >= policy.max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    source,
                })
            }
            Err(err) => {
                let delay = delay_for_attempt(policy, attempt);
                debug!(
                    "attempt {}/{} failed: {}; retrying in {:?}",
                    attempt, policy.max_attempts, err, delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn immediate(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::ZERO)
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(3));
        assert_eq!(delay_for_attempt(&policy, 1), Duration::from_secs(3));
        assert_eq!(delay_for_attempt(&policy, 4), Duration::from_secs(3));
    }

    #[test]
    fn test_exponential_backoff_growth_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            strategy: RetryStrategy::ExponentialBackoff,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            backoff_multiplier: 2.0,
        };
        assert_eq!(delay_for_attempt(&policy, 1), Duration::from_millis(100));
        assert_eq!(delay_for_attempt(&policy, 2), Duration::from_millis(200));
        // Attempt 3 would be 400ms; the cap wins.
        assert_eq!(delay_for_attempt(&policy, 3), Duration::from_millis(350));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy {
            max_attempts: 4,
            strategy: RetryStrategy::LinearBackoff,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
        };
        assert_eq!(delay_for_attempt(&policy, 1), Duration::from_millis(10));
        assert_eq!(delay_for_attempt(&policy, 3), Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy(&immediate(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>("done")
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy(&immediate(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(std::io::Error::other("not yet"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempt_count() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy(&immediate(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(std::io::Error::other("still down")) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(err.to_string().contains("still down"));
    }
}
