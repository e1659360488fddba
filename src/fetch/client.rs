//! HTTP client wrapper with bounded retries.
//!
//! This module provides the [`FetchClient`] struct which issues outbound
//! requests, retries transient failures with exponential backoff and fails
//! fast on client errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::CONNECT_TIMEOUT_SECS;
use super::error::{BODY_SNIPPET_CHARS, FetchError, LastFailure, TimeoutCause};
use super::options::FetchOptions;
use super::retry::{FailureType, RetryDecision, classify_status};
use super::sleeper::{Sleeper, TokioSleeper};
use crate::user_agent;

/// Upper bound on the buffer preallocated from a Content-Length header.
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Bytes of a fatal response body read for the error snippet (room for
/// [`BODY_SNIPPET_CHARS`] four-byte characters).
const ERROR_BODY_READ_LIMIT: usize = BODY_SNIPPET_CHARS * 4;

/// HTTP client for fetching filing documents with retry support.
///
/// Create once and reuse; clones share the underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use finsight_core::fetch::{FetchClient, FetchOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FetchClient::new();
/// let bytes = client
///     .download_file("https://www.sec.gov/Archives/edgar/data/320193/x/aapl-10k.htm", &FetchOptions::default())
///     .await?;
/// println!("Downloaded {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Creates a new client with the default connect timeout (30 seconds).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_connect_timeout(CONNECT_TIMEOUT_SECS)
    }

    /// Creates a new client with an explicit connect timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_connect_timeout(connect_timeout_secs: u64) -> Self {
        let client = build_client(connect_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the backoff sleeper (used by tests to record delays).
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Issues a request, retrying 429/5xx responses and transport errors.
    ///
    /// Returns the first successful (2xx) response unmodified.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` does not parse
    /// - [`FetchError::Client`] on any 4xx except 429, after a single attempt
    /// - [`FetchError::RetryExhausted`] when every attempt failed retryably
    /// - [`FetchError::Timeout`] when the deadline or cancellation token fires
    #[instrument(skip(self, options), fields(url = %url, max_retries = options.max_retries))]
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Response, FetchError> {
        let guard = CallGuard::new(options);
        self.fetch_guarded(url, options, &guard).await
    }

    /// Fetches `url` with retries and reads the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns any error of [`fetch_with_retry`](Self::fetch_with_retry),
    /// [`FetchError::Read`] if the body stream fails, or
    /// [`FetchError::BodyTooLarge`] if `max_body_bytes` is exceeded.
    #[instrument(skip(self, options), fields(url = %url))]
    pub async fn download_file(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Vec<u8>, FetchError> {
        let guard = CallGuard::new(options);
        let response = self.fetch_guarded(url, options, &guard).await?;
        let bytes = guard
            .run(read_body(response, url, options.max_body_bytes))
            .await
            .map_err(|cause| FetchError::timeout(url, cause, guard.elapsed()))??;

        info!(bytes = bytes.len(), "download complete");
        Ok(bytes)
    }

    async fn fetch_guarded(
        &self,
        url: &str,
        options: &FetchOptions,
        guard: &CallGuard<'_>,
    ) -> Result<Response, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let policy = options.retry_policy();
        let timed_out = |cause| FetchError::timeout(url, cause, guard.elapsed());

        let mut attempt = FetchAttempt::first(url);
        loop {
            let sent = guard
                .run(self.send_once(&parsed, options))
                .await
                .map_err(timed_out)?;

            let (failure_type, last) = match sent {
                Ok(response) if response.status().is_success() => {
                    let status = response.status().as_u16();
                    attempt.finish(AttemptOutcome::Success, Some(status));
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let failure_type = classify_status(status);
                    if failure_type == FailureType::Permanent {
                        attempt.finish(AttemptOutcome::FatalFailure, Some(status));
                        let body = guard
                            .run(read_error_snippet(response))
                            .await
                            .map_err(timed_out)?;
                        warn!(status, "client error - not retrying");
                        return Err(FetchError::client(url, status, &body));
                    }
                    attempt.finish(AttemptOutcome::RetryableFailure, Some(status));
                    (failure_type, LastFailure::Status(status))
                }
                Err(error) => {
                    attempt.finish(AttemptOutcome::RetryableFailure, None);
                    debug!(error = %error, "transport error");
                    (FailureType::Transient, LastFailure::Transport(error.to_string()))
                }
            };

            match policy.should_retry(failure_type, attempt.number) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        attempt = next_attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        last = %last,
                        "retrying fetch"
                    );
                    guard
                        .run(self.sleeper.sleep(delay))
                        .await
                        .map_err(timed_out)?;
                    attempt = attempt.next(delay);
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(attempts = attempt.number, %reason, last = %last, "giving up");
                    return Err(FetchError::retry_exhausted(url, attempt.number, last));
                }
            }
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        options: &FetchOptions,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self
            .client
            .request(options.method.clone(), url.clone())
            .headers(options.headers.clone())
            .timeout(options.attempt_timeout);
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }
        request.send().await
    }
}

/// One attempt inside a single fetch call. Never escapes the call.
#[derive(Debug)]
struct FetchAttempt<'a> {
    url: &'a str,
    number: u32,
    delay_before: Duration,
}

#[derive(Debug, Clone, Copy)]
enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
}

impl<'a> FetchAttempt<'a> {
    fn first(url: &'a str) -> Self {
        Self {
            url,
            number: 1,
            delay_before: Duration::ZERO,
        }
    }

    fn next(&self, delay: Duration) -> Self {
        Self {
            url: self.url,
            number: self.number + 1,
            delay_before: delay,
        }
    }

    fn finish(&self, outcome: AttemptOutcome, status: Option<u16>) {
        debug!(
            url = self.url,
            attempt = self.number,
            delay_before_ms = self.delay_before.as_millis(),
            ?outcome,
            status,
            "fetch attempt finished"
        );
    }
}

/// Enforces the caller's overall deadline and cancellation token.
struct CallGuard<'a> {
    started: Instant,
    deadline: Option<Instant>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> CallGuard<'a> {
    fn new(options: &'a FetchOptions) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: options.deadline.map(|budget| started + budget),
            cancel: options.cancel.as_ref(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Runs `future` unless the deadline or the token fires first.
    async fn run<F: Future>(&self, future: F) -> Result<F::Output, TimeoutCause> {
        let cancelled = async {
            match self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Err(TimeoutCause::Cancelled),
            () = deadline => Err(TimeoutCause::Deadline),
            output = future => Ok(output),
        }
    }
}

/// Streams the response body into memory, enforcing `limit` if set.
async fn read_body(
    response: Response,
    url: &str,
    limit: Option<u64>,
) -> Result<Vec<u8>, FetchError> {
    if let (Some(limit), Some(declared)) = (limit, response.content_length())
        && declared > limit
    {
        return Err(FetchError::body_too_large(url, limit));
    }

    let capacity = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0)
        .min(MAX_PREALLOCATION);
    let mut buffer = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::read(url, e))?;
        buffer.extend_from_slice(&chunk);
        if let Some(limit) = limit
            && buffer.len() as u64 > limit
        {
            return Err(FetchError::body_too_large(url, limit));
        }
    }

    Ok(buffer)
}

/// Reads at most [`ERROR_BODY_READ_LIMIT`] bytes of an error body; stream
/// failures just end the snippet.
async fn read_error_snippet(response: Response) -> String {
    let mut buffer = Vec::new();
    let mut stream = response.bytes_stream();
    while buffer.len() < ERROR_BODY_READ_LIMIT {
        let Some(Ok(chunk)) = stream.next().await else {
            break;
        };
        let room = ERROR_BODY_READ_LIMIT - buffer.len();
        buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn build_client(connect_timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_fetch_user_agent())
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::mock_server;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_invalid_url_fails_before_any_attempt() {
        let client = FetchClient::new();
        let result = tokio_test::block_on(
            client.fetch_with_retry("not-a-valid-url", &FetchOptions::default()),
        );
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_surfaces_timeout() {
        let token = CancellationToken::new();
        token.cancel();
        let options = FetchOptions::default().with_cancellation(token);

        let client = FetchClient::new();
        let result = client
            .fetch_with_retry("http://127.0.0.1:9/never", &options)
            .await;

        match result {
            Err(FetchError::Timeout { cause, .. }) => assert_eq!(cause, TimeoutCause::Cancelled),
            other => panic!("Expected Timeout, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_success_returns_response_unmodified() {
        let Some(mock_server) = mock_server().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/filing.htm"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-filing", "10-K")
                    .set_body_string("<html>annual report</html>"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FetchClient::new();
        let url = format!("{}/filing.htm", mock_server.uri());
        let response = client
            .fetch_with_retry(&url, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.headers().get("x-filing").unwrap(), "10-K");
        assert_eq!(response.text().await.unwrap(), "<html>annual report</html>");
    }

    #[tokio::test]
    async fn test_download_file_rejects_oversized_body() {
        let Some(mock_server) = mock_server().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/big.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 2048]))
            .mount(&mock_server)
            .await;

        let client = FetchClient::new();
        let url = format!("{}/big.pdf", mock_server.uri());
        let options = FetchOptions::default().with_max_body_bytes(1024);
        let result = client.download_file(&url, &options).await;

        assert!(
            matches!(result, Err(FetchError::BodyTooLarge { limit: 1024, .. })),
            "got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_error_snippet_reads_only_a_bounded_prefix() {
        let Some(mock_server) = mock_server().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/missing.htm"))
            .respond_with(ResponseTemplate::new(404).set_body_bytes(vec![b'e'; 1024 * 1024]))
            .mount(&mock_server)
            .await;

        let url = format!("{}/missing.htm", mock_server.uri());
        let response = reqwest::get(&url).await.unwrap();
        let snippet = read_error_snippet(response).await;
        assert_eq!(snippet.len(), ERROR_BODY_READ_LIMIT);

        let result = FetchClient::new()
            .fetch_with_retry(&url, &FetchOptions::default())
            .await;
        match result {
            Err(FetchError::Client { status, body, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(body.len(), BODY_SNIPPET_CHARS);
            }
            other => panic!("Expected Client error, got: {other:?}"),
        }
    }
}
