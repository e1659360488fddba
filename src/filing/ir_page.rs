//! Investor-relations page locator.
//!
//! Fallback for companies without EDGAR filings (or when EDGAR has no
//! match): fetch the company's IR page and pick the first PDF link whose
//! text and href mention a financial keyword, the target year and the
//! target period.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderValue, USER_AGENT};
use tracing::{debug, instrument};
use url::Url;

use super::{FilingLocator, FilingTarget, LocateError, Quarter};
use crate::fetch::{FetchClient, FetchOptions, RateLimiter};
use crate::user_agent::BROWSER_USER_AGENT;

/// IR pages are HTML listings; anything larger is not one.
const MAX_PAGE_BYTES: u64 = 10 * 1024 * 1024;

const FINANCIAL_KEYWORDS: [&str; 8] = [
    "EARNINGS",
    "FINANCIAL",
    "QUARTERLY",
    "ANNUAL",
    "10-Q",
    "10-K",
    "RESULTS",
    "PRESS RELEASE",
];

#[allow(clippy::expect_used)]
static ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("static anchor pattern must compile")
});

#[allow(clippy::expect_used)]
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static tag pattern must compile"));

#[allow(clippy::expect_used)]
static PERIOD_PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        r"\bQ1\b|FIRST\s+QUARTER|\b1Q\b",
        r"\bQ2\b|SECOND\s+QUARTER|\b2Q\b",
        r"\bQ3\b|THIRD\s+QUARTER|\b3Q\b",
        r"\bQ4\b|FOURTH\s+QUARTER|\b4Q\b",
        r"\bFY\b|ANNUAL|YEAR\s+END|\b10-?K\b",
    ]
    .map(|pattern| Regex::new(pattern).expect("static period pattern must compile"))
});

fn period_pattern(quarter: Quarter) -> &'static Regex {
    let index = match quarter {
        Quarter::Q1 => 0,
        Quarter::Q2 => 1,
        Quarter::Q3 => 2,
        Quarter::Q4 => 3,
        Quarter::Fy => 4,
    };
    &PERIOD_PATTERNS[index]
}

/// Finds the first PDF link on an IR page matching `year` and `quarter`.
///
/// Relative hrefs are resolved against `page_url`. Returns `None` when no
/// anchor qualifies or `page_url` is not absolute.
#[must_use]
pub fn find_filing_link(
    html: &str,
    page_url: &str,
    year: i32,
    quarter: Quarter,
) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let year = year.to_string();
    let period = period_pattern(quarter);

    ANCHOR_PATTERN.captures_iter(html).find_map(|captures| {
        let href = captures.get(1)?.as_str().trim();
        let text = TAG_PATTERN.replace_all(captures.get(2)?.as_str(), " ");
        let haystack = format!("{text} {href}").to_uppercase();

        let is_pdf = href
            .split(['?', '#'])
            .next()
            .is_some_and(|path| path.to_ascii_lowercase().ends_with(".pdf"));
        let qualifies = is_pdf
            && haystack.contains(&year)
            && FINANCIAL_KEYWORDS.iter().any(|k| haystack.contains(k))
            && period.is_match(&haystack);
        if !qualifies {
            return None;
        }

        base.join(href).ok().map(String::from)
    })
}

/// Locates filings by scraping the company's investor-relations page.
///
/// Sends a browser User-Agent; many IR sites serve bot walls otherwise.
pub struct IrPageLocator {
    client: FetchClient,
    options: FetchOptions,
    rate_limiter: Option<Arc<RateLimiter>>,
    page_override: Option<String>,
}

impl IrPageLocator {
    #[must_use]
    pub fn new(client: FetchClient, options: FetchOptions) -> Self {
        let options = options
            .with_header(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT))
            .with_max_body_bytes(MAX_PAGE_BYTES);
        Self {
            client,
            options,
            rate_limiter: None,
            page_override: None,
        }
    }

    /// Scrapes `page_url` for every target instead of the company's IR page
    /// (for testing with wiremock).
    #[must_use]
    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_override = Some(page_url.into());
        self
    }

    /// Spaces page requests through a shared limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }
}

impl std::fmt::Debug for IrPageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrPageLocator")
            .field("page_override", &self.page_override)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FilingLocator for IrPageLocator {
    fn name(&self) -> &'static str {
        "ir_page"
    }

    #[instrument(skip(self, target), fields(locator = "ir_page", target = %target))]
    async fn locate(&self, target: &FilingTarget) -> Result<Option<String>, LocateError> {
        let page_url = self.page_override.as_deref().unwrap_or(target.company.ir_url);
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(page_url).await;
        }

        let body = self.client.download_file(page_url, &self.options).await?;
        let html = String::from_utf8_lossy(&body);
        let link = find_filing_link(&html, page_url, target.year, target.quarter);

        if link.is_none() {
            debug!(page_bytes = body.len(), "no matching PDF link on IR page");
        }
        Ok(link)
    }
}
