//! Per-call options for [`FetchClient`](super::FetchClient).

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;

use super::constants::{ATTEMPT_TIMEOUT, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
use super::retry::RetryPolicy;

/// Options recognised by `fetch_with_retry` and `download_file`.
///
/// Every field has a default, so callers only set what they need:
///
/// ```
/// use std::time::Duration;
/// use finsight_core::fetch::FetchOptions;
///
/// let options = FetchOptions::default()
///     .with_max_retries(5)
///     .with_initial_delay(Duration::from_millis(200));
/// assert_eq!(options.max_retries, 5);
/// ```
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total attempts including the first one (values below 1 behave as 1).
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub initial_delay: Duration,
    /// HTTP method (GET by default).
    pub method: Method,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
    /// Timeout applied to each individual attempt. Expiry counts as a
    /// retryable transport failure.
    pub attempt_timeout: Duration,
    /// Overall budget for the whole call, retries and waits included.
    /// Expiry aborts with `FetchError::Timeout`.
    pub deadline: Option<Duration>,
    /// Cancels the call with `FetchError::Timeout` when triggered.
    pub cancel: Option<CancellationToken>,
    /// Cap on the body size read by `download_file`.
    pub max_body_bytes: Option<u64>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            attempt_timeout: ATTEMPT_TIMEOUT,
            deadline: None,
            cancel: None,
            max_body_bytes: None,
        }
    }
}

impl FetchOptions {
    /// Sets the attempt budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial backoff delay.
    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a request header, replacing any previous value for that name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Sets the overall deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Caps the body size accepted by `download_file`.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    /// Retry policy derived from these options.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.initial_delay)
    }
}
