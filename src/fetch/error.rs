//! Error types for the fetch module.
//!
//! Every variant is scoped to a single `fetch_with_retry` / `download_file`
//! call, so a batch caller can record the failure against one filing and
//! keep going with the rest.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Maximum number of characters of a client-error body kept for diagnostics.
pub(crate) const BODY_SNIPPET_CHARS: usize = 512;

/// Errors that can occur while fetching a remote document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP 4xx response (any 4xx except 429).
    #[error("client error: HTTP {status} fetching {url}: {body}")]
    Client {
        /// The URL that was rejected.
        url: String,
        /// The HTTP status code (400..=499, never 429).
        status: u16,
        /// Leading part of the response body text.
        body: String,
    },

    /// Retry budget consumed while only retryable failures occurred.
    #[error("Fetch failed after {attempts} attempts for {url}: {last}")]
    RetryExhausted {
        /// The URL that kept failing.
        url: String,
        /// Number of attempts made (equals the configured budget).
        attempts: u32,
        /// The failure observed on the final attempt.
        last: LastFailure,
    },

    /// The caller's deadline elapsed or its cancellation token fired.
    #[error("timeout fetching {url}: {cause} after {elapsed:?}")]
    Timeout {
        /// The URL whose fetch was aborted.
        url: String,
        /// What triggered the abort.
        cause: TimeoutCause,
        /// Time spent in the call before it was aborted.
        elapsed: Duration,
    },

    /// The provided URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The response arrived but its body could not be read.
    #[error("failed reading response body from {url}: {source}")]
    Read {
        /// The URL whose body failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body exceeded the configured cap.
    #[error("response body from {url} exceeds {limit} bytes")]
    BodyTooLarge {
        /// The URL that produced the oversized body.
        url: String,
        /// The configured limit in bytes.
        limit: u64,
    },
}

/// The last failure seen before the retry budget ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastFailure {
    /// The server answered with a retryable status (429, 5xx, ...).
    Status(u16),
    /// The request never produced a response (connect error, attempt timeout).
    Transport(String),
}

impl fmt::Display for LastFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Transport(message) => write!(f, "network error: {message}"),
        }
    }
}

/// Why a fetch was aborted with [`FetchError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCause {
    /// The overall deadline in `FetchOptions` elapsed.
    Deadline,
    /// The cancellation token in `FetchOptions` was triggered.
    Cancelled,
}

impl fmt::Display for TimeoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadline => f.write_str("deadline elapsed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl FetchError {
    /// Creates a client error, truncating the body to a diagnostic snippet.
    pub fn client(url: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Client {
            url: url.into(),
            status,
            body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
        }
    }

    /// Creates a retry-exhausted error.
    pub fn retry_exhausted(url: impl Into<String>, attempts: u32, last: LastFailure) -> Self {
        Self::RetryExhausted {
            url: url.into(),
            attempts,
            last,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, cause: TimeoutCause, elapsed: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            cause,
            elapsed,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a body read error.
    pub fn read(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Read {
            url: url.into(),
            source,
        }
    }

    /// Creates a body-too-large error.
    pub fn body_too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::BodyTooLarge {
            url: url.into(),
            limit,
        }
    }

    /// HTTP status associated with the error, when one was observed.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } => Some(*status),
            Self::RetryExhausted {
                last: LastFailure::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Short stable label for the error variant, used in manifests and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client { .. } => "client_error",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::Timeout { .. } => "timeout",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Read { .. } => "read_error",
            Self::BodyTooLarge { .. } => "body_too_large",
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL for context, so the
// constructors above are the only way in.
