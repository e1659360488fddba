//! Retrying HTTP fetch helper for filing documents.
//!
//! # Features
//!
//! - Bounded retries with exponential backoff (`initial_delay * 2^k`)
//! - 429 and 5xx retried, every other 4xx fails immediately
//! - Transport errors share the retry budget
//! - Optional overall deadline and cancellation token
//! - Non-blocking backoff behind a [`Sleeper`] seam
//! - Per-domain request spacing via [`RateLimiter`]
//!
//! # Example
//!
//! ```no_run
//! use finsight_core::fetch::{FetchClient, FetchError, FetchOptions};
//!
//! # async fn example() -> Result<(), FetchError> {
//! let client = FetchClient::new();
//! let options = FetchOptions::default().with_max_retries(4);
//! let bytes = client.download_file("https://example.com/10-Q.pdf", &options).await?;
//! println!("{} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
pub(crate) mod constants;
mod error;
mod options;
pub mod rate_limiter;
mod retry;
mod sleeper;

pub use client::FetchClient;
pub use constants::{ATTEMPT_TIMEOUT, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
pub use error::{FetchError, LastFailure, TimeoutCause};
pub use options::FetchOptions;
pub use rate_limiter::{RateLimiter, extract_domain};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_status};
pub use sleeper::{Sleeper, TokioSleeper};
