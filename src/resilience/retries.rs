//! Retry logic.
//!
//! # Responsibilities
//! - Re-execute a failing operation up to `max_attempts` times
//! - Wait a fixed duration between attempts
//!
//! # Design Decisions
//! - Every failure is retryable; callers only wrap idempotent reads
//! - No wait after the final attempt
//! - The last failure is returned unchanged

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;

/// Bounded, fixed-delay retry policy. Stateless and cheap to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait_duration: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32, wait_duration: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait_duration,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.wait_duration())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn wait_duration(&self) -> Duration {
        self.wait_duration
    }

    /// Run `operation` until it succeeds or attempts are exhausted.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait = ?self.wait_duration,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    metrics::record_retry_attempt();
                    tokio::time::sleep(self.wait_duration).await;
                    attempt += 1;
                }
                Err(e) => {
                    if self.max_attempts > 1 {
                        tracing::error!(attempts = attempt, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
