//! Bounded retry for fallible async operations.
//!
//! Every failure is retried the same way; there is no classification of
//! transient vs. permanent errors. The last attempt's error is returned
//! exactly as the operation produced it.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Retry policy with linear backoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay unit in milliseconds; the wait after attempt `n` is `n * base_delay_ms`
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
        }
    }

    /// Delay to wait after a failed attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(attempt as u64))
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Upper bound on total time spent sleeping between attempts
    pub fn worst_case_delay(&self) -> Duration {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

/// Raised when a policy allows zero attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetriesExhausted {
    pub attempts: u32,
}

/// Run `operation` until it succeeds or the policy's attempts are used up.
///
/// The operation is a closure producing a fresh future per attempt. A policy
/// with `max_attempts == 0` never invokes it and yields [`RetriesExhausted`].
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + From<RetriesExhausted>,
{
    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if policy.should_retry(attempt) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(attempt, error = %e, "Operation failed permanently");
                return Err(e);
            }
        }
    }

    Err(E::from(RetriesExhausted {
        attempts: policy.max_attempts,
    }))
}

impl From<RetriesExhausted> for super::error::ExtractionError {
    fn from(e: RetriesExhausted) -> Self {
        Self::MaxRetriesExceeded {
            attempts: e.attempts,
        }
    }
}
