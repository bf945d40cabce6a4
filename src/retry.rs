//! Bounded retry with fixed delay.
//!
//! Both mailbox backends and the provisioner share the same shape: attempt an
//! operation up to N times, sleep a fixed interval between attempts, stop on
//! the first success. [`RetryPolicy`] is that shape, parameterized by the
//! attempt function.

use crate::config::{PollingConfig, ProvisionConfig};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Attempt N times, sleep D between, stop on first success.
///
/// The delay is only applied between attempts, so a policy of N attempts
/// performs at most N-1 sleeps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts. Treated as at least 1.
    pub attempts: u32,
    /// Delay between consecutive attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Runs `op` until it yields `Some`, or attempts are exhausted.
    ///
    /// `op` receives the 1-indexed attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let attempts = self.attempts.max(1);

        for attempt in 1..=attempts {
            if let Some(value) = op(attempt).await {
                debug!(attempt, "attempt succeeded");
                return Some(value);
            }

            if attempt < attempts {
                debug!(
                    attempt,
                    interval_secs = self.interval.as_secs(),
                    "attempt yielded nothing, waiting before retry"
                );
                tokio::time::sleep(self.interval).await;
            }
        }

        None
    }

    /// Runs `op` until it yields `Ok`, or attempts are exhausted.
    ///
    /// # Errors
    ///
    /// Returns the error from the final attempt when every attempt fails.
    pub async fn run_result<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match op(attempt).await {
                Ok(value) => {
                    debug!(attempt, "attempt succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    last_err = Some(err);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(last_err.expect("at least one attempt was made"))
    }
}

impl From<&PollingConfig> for RetryPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self::new(config.attempts, config.interval)
    }
}

impl From<&ProvisionConfig> for RetryPolicy {
    fn from(config: &ProvisionConfig) -> Self {
        Self::new(config.attempts, config.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_first_success() {
        let policy = RetryPolicy::new(5, Duration::from_secs(5));
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { (attempt == 3).then(|| "hit") }
            })
            .await;

        assert_eq!(result, Some("hit"));
        // Attempts 4 and 5 never execute.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhaustion_sleeps_n_minus_one_times() {
        let policy = RetryPolicy::new(5, Duration::from_secs(5));
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Option<&str> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 5 attempts, 4 inter-attempt delays.
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_no_sleep_after_final_attempt() {
        let policy = RetryPolicy::new(1, Duration::from_secs(60));
        let start = Instant::now();

        let result: Option<()> = policy.run(|_| async { None }).await;

        assert_eq!(result, None);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_result_succeeds_on_last_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3));

        let result: Result<u32, &str> = policy
            .run_result(|attempt| async move {
                if attempt == 5 {
                    Ok(attempt)
                } else {
                    Err("not yet")
                }
            })
            .await;

        assert_eq!(result, Ok(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_result_returns_last_error() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3));
        let start = Instant::now();

        let result: Result<(), String> = policy
            .run_result(|attempt| async move { Err(format!("attempt {attempt} failed")) })
            .await;

        assert_eq!(result.unwrap_err(), "attempt 5 failed");
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_treated_as_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result: Option<()> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_from_configs() {
        let polling = PollingConfig::default();
        let policy = RetryPolicy::from(&polling);
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.interval, Duration::from_secs(5));

        let provisioning = ProvisionConfig::default();
        let policy = RetryPolicy::from(&provisioning);
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.interval, Duration::from_secs(3));
    }
}
