//! Retry utilities for resilient operations
//!
//! Every network call in the harvester goes through [`execute_with_retry`].
//! Failures are retried uniformly after a delay drawn at random from a
//! [`DelayRange`]; once the attempt budget is spent the call yields `None`
//! and the caller decides whether to skip the unit or escalate.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default lower bound of the retry delay in milliseconds
pub const DEFAULT_DELAY_MIN_MS: u64 = 4_000;

/// Default upper bound of the retry delay in milliseconds
pub const DEFAULT_DELAY_MAX_MS: u64 = 5_500;

/// Default attempt budget for a single retried call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 999;

/// Inclusive range of milliseconds to wait, re-sampled on every use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// Create a range, swapping the bounds if they are reversed
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// A range that always yields the same delay
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    /// No delay at all
    pub fn zero() -> Self {
        Self::fixed(0)
    }

    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }

    /// Draw a delay uniformly from the inclusive range
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleep for a freshly sampled delay and return how long it was
    pub async fn wait(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY_MIN_MS, DEFAULT_DELAY_MAX_MS)
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay between a failed attempt and the next one
    pub delay: DelayRange,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DelayRange::default(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom attempt budget and the default delay
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a policy with a custom attempt budget and delay
    pub fn with_delay(max_attempts: u32, delay: DelayRange) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Execute an operation, retrying every failure until the budget is spent
///
/// Returns `Some(value)` on the first success and `None` once
/// `policy.max_attempts` attempts have failed. All error kinds are treated the
/// same; callers that need to tell them apart must classify before retrying.
///
/// # Example
///
/// ```no_run
/// use harvester::utils::retry::{execute_with_retry, RetryPolicy};
///
/// # async fn example() {
/// let policy = RetryPolicy::new(3);
/// let value = execute_with_retry(&policy, || async { Ok::<_, std::io::Error>(42) }).await;
/// assert_eq!(value, Some(42));
/// # }
/// ```
pub async fn execute_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut remaining = policy.max_attempts;
    let mut failures: u32 = 0;

    while remaining > 0 {
        match operation().await {
            Ok(value) => {
                if failures > 0 {
                    debug!(failures, "Operation succeeded after retry");
                }
                return Some(value);
            }
            Err(e) => {
                failures += 1;
                remaining -= 1;

                if remaining == 0 {
                    warn!(attempt = failures, error = %e, "Operation failed, retries exhausted");
                    break;
                }

                let delay = policy.delay.sample();
                warn!(
                    attempt = failures,
                    remaining,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    None
}
