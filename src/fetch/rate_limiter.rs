//! Per-domain request spacing.
//!
//! SEC EDGAR and company IR sites throttle aggressive clients, so the ingest
//! engine spaces requests to the same host. Requests to different hosts
//! proceed in parallel.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use finsight_core::fetch::RateLimiter;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
//! assert_eq!(limiter.spacing(), Duration::from_millis(100));
//!
//! // First request proceeds immediately
//! limiter.acquire("https://www.sec.gov/Archives/a.htm").await;
//!
//! // Second request to the same host waits for the spacing
//! let start = Instant::now();
//! limiter.acquire("https://www.sec.gov/Archives/b.htm").await;
//! assert!(start.elapsed() >= Duration::from_millis(90));
//!
//! // Another host proceeds immediately
//! limiter.acquire("https://investor.nvidia.com/q1.pdf").await;
//!
//! assert!(RateLimiter::new(Duration::ZERO).is_disabled());
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::CUMULATIVE_DELAY_WARNING_THRESHOLD;

/// Per-host request spacing, shared across ingest tasks via `Arc`.
///
/// Each host gets its own slot; the slot's `tokio::sync::Mutex` serialises
/// callers for that host while other hosts proceed.
#[derive(Debug)]
pub struct RateLimiter {
    /// `None` when spacing is switched off (`--rate-limit 0`).
    spacing: Option<Duration>,
    hosts: DashMap<String, Arc<Mutex<HostSlot>>>,
}

#[derive(Debug, Default)]
struct HostSlot {
    /// `None` until the first request, which never waits.
    last_request: Option<Instant>,
    /// Total time callers have waited on this host.
    waited: Duration,
}

impl HostSlot {
    /// How long a request arriving `now` must wait, given `spacing`.
    fn wait_needed(&self, now: Instant, spacing: Duration) -> Duration {
        self.last_request
            .map_or(Duration::ZERO, |last| spacing.saturating_sub(now - last))
    }
}

impl RateLimiter {
    /// Creates a limiter spacing requests to one host by `spacing`.
    ///
    /// A zero spacing behaves like [`RateLimiter::disabled`].
    #[must_use]
    #[instrument(skip_all, fields(spacing_ms = spacing.as_millis()))]
    pub fn new(spacing: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            spacing: (!spacing.is_zero()).then_some(spacing),
            hosts: DashMap::new(),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            spacing: None,
            hosts: DashMap::new(),
        }
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.spacing.is_none()
    }

    /// Minimum gap between requests to one host (zero when disabled).
    #[must_use]
    pub fn spacing(&self) -> Duration {
        self.spacing.unwrap_or_default()
    }

    /// Waits until a request to `url`'s host is allowed, then records it.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) {
        let Some(spacing) = self.spacing else {
            return;
        };

        let host = extract_domain(url);
        tracing::Span::current().record("host", &host);

        // clone the Arc so the DashMap shard lock is released before awaiting
        let slot = Arc::clone(self.hosts.entry(host.clone()).or_default().value());
        let mut slot = slot.lock().await;

        let wait = slot.wait_needed(Instant::now(), spacing);
        if !wait.is_zero() {
            slot.waited += wait;
            debug!(
                %host,
                wait_ms = wait.as_millis(),
                waited_ms = slot.waited.as_millis(),
                "spacing request"
            );
            if slot.waited >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                warn!(
                    %host,
                    waited_secs = slot.waited.as_secs(),
                    "heavy throttling on host; consider narrowing the filing selection"
                );
            }
            tokio::time::sleep(wait).await;
        }

        slot.last_request = Some(Instant::now());
    }
}

/// Extracts the lowercase host from a URL, or `"unknown"` if it has none.
///
/// ```
/// use finsight_core::fetch::extract_domain;
///
/// assert_eq!(extract_domain("https://www.SEC.gov/Archives"), "www.sec.gov");
/// assert_eq!(extract_domain("not a url"), "unknown");
/// ```
#[must_use]
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}
