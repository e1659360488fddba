//! Retry policy with exponential backoff for transient fetch failures.
//!
//! A failed attempt is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - 5xx responses and transport errors
//! - [`FailureType::RateLimited`] - HTTP 429, retried like transient failures
//! - [`FailureType::Permanent`] - every other 4xx; never retried
//!
//! The [`RetryPolicy`] then decides whether another attempt is allowed and
//! how long to wait first.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use finsight_core::fetch::{RetryDecision, RetryPolicy, classify_status};
//!
//! let policy = RetryPolicy::new(3, Duration::from_millis(500));
//!
//! match policy.should_retry(classify_status(503), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_millis(500));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("unexpected: {reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};

/// Why an attempt failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// 5xx, unexpected statuses, connection errors and attempt timeouts.
    Transient,
    /// HTTP 429.
    RateLimited,
    /// Any other 4xx; the same request will keep failing.
    Permanent,
}

impl FailureType {
    /// Whether this failure type is eligible for another attempt.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Permanent)
    }
}

/// Outcome of [`RetryPolicy::should_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep `delay`, then make attempt number `attempt` (1-based).
    Retry { delay: Duration, attempt: u32 },
    /// Stop; `reason` ends up in logs.
    DoNotRetry { reason: String },
}

/// Attempt budget plus exponential backoff.
///
/// The wait after the attempt with 0-based index `k` failed is
/// `initial_delay * 2^k`; with the defaults (3 attempts, 500ms) the waits
/// are 500ms then 1s. No jitter is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    max_attempts: u32,
    initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    ///
    /// `max_attempts` below 1 is clamped to 1.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Creates a policy with a custom `max_attempts`, using the default delay.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, DEFAULT_INITIAL_DELAY)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Backoff delay after the attempt with the given 0-based index failed.
    #[must_use]
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt_index);
        self.initial_delay.saturating_mul(factor)
    }

    /// Decides what follows the failure of attempt number `attempt` (1-based).
    #[instrument(level = "trace", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure: FailureType, attempt: u32) -> RetryDecision {
        if !failure.is_retryable() {
            return RetryDecision::DoNotRetry {
                reason: "client error - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "attempt budget spent");
            return RetryDecision::DoNotRetry {
                reason: format!("all {} attempts exhausted", self.max_attempts),
            };
        }

        let delay = self.backoff_delay(attempt.saturating_sub(1));

        debug!(attempt, backoff_ms = delay.as_millis(), "scheduling retry");

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a non-success HTTP status.
///
/// 429 is [`FailureType::RateLimited`], any other 4xx is
/// [`FailureType::Permanent`] and everything else (5xx, stray 3xx) is
/// [`FailureType::Transient`].
#[must_use]
pub fn classify_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        400..=499 => FailureType::Permanent,
        _ => FailureType::Transient,
    }
}
