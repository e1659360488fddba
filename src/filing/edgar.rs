//! SEC EDGAR locator.
//!
//! Looks up a company's submissions index on `data.sec.gov` and picks the
//! filing whose form, year and filing month fit the target period. The
//! selection itself ([`select_filing`]) is a pure function over the decoded
//! index so it can be tested without a network.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{FilingLocator, FilingTarget, LocateError, Quarter};
use crate::fetch::{FetchClient, FetchOptions, RateLimiter};
use crate::user_agent::edgar_user_agent;

/// Default submissions index base URL.
const SUBMISSIONS_BASE_URL: &str = "https://data.sec.gov/submissions";

/// Default filing archive base URL.
const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";

// ==================== Submissions Index Types ====================

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    recent: RecentFilings,
}

/// The `filings.recent` block of a submissions index: parallel arrays, one
/// entry per filing, newest first.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    #[serde(default)]
    pub accession_number: Vec<String>,
    #[serde(default)]
    pub filing_date: Vec<String>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default)]
    pub primary_document: Vec<String>,
}

/// A filing picked out of [`RecentFilings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilingRef<'a> {
    pub accession_number: &'a str,
    pub filing_date: &'a str,
    pub primary_document: &'a str,
}

/// Picks the newest filing matching `year` and `quarter`.
///
/// A filing matches when its form equals [`Quarter::form_type`], its filing
/// year is within one year of `year` (fiscal years rarely align with
/// calendar years) and, for quarterly targets, its filing month falls in
/// [`Quarter::filing_months`]. Entries with unparseable dates are skipped.
#[must_use]
pub fn select_filing(
    recent: &RecentFilings,
    year: i32,
    quarter: Quarter,
) -> Option<FilingRef<'_>> {
    let form_type = quarter.form_type();
    let months = quarter.filing_months();

    recent
        .form
        .iter()
        .zip(&recent.filing_date)
        .zip(&recent.accession_number)
        .zip(&recent.primary_document)
        .find_map(|(((form, date), accession), document)| {
            if form != form_type || document.is_empty() {
                return None;
            }
            let (filed_year, filed_month) = parse_filing_date(date)?;
            if (filed_year - year).abs() > 1 {
                return None;
            }
            if !months.is_empty() && !months.contains(&filed_month) {
                return None;
            }
            Some(FilingRef {
                accession_number: accession,
                filing_date: date,
                primary_document: document,
            })
        })
}

/// Archive URL of a filing's primary document.
#[must_use]
pub fn archive_url(archives_base: &str, cik: &str, filing: &FilingRef<'_>) -> String {
    let cik = cik.trim_start_matches('0');
    let cik = if cik.is_empty() { "0" } else { cik };
    format!(
        "{}/{}/{}/{}",
        archives_base.trim_end_matches('/'),
        cik,
        filing.accession_number.replace('-', ""),
        filing.primary_document
    )
}

fn parse_filing_date(date: &str) -> Option<(i32, u32)> {
    let mut parts = date.split('-');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

// ==================== EdgarLocator ====================

/// Locates filings through the SEC EDGAR submissions index.
///
/// Requests carry the SEC-compliant User-Agent from
/// [`edgar_user_agent`](crate::user_agent::edgar_user_agent).
pub struct EdgarLocator {
    client: FetchClient,
    options: FetchOptions,
    submissions_base: String,
    archives_base: String,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl EdgarLocator {
    /// Creates a locator against the public EDGAR endpoints.
    #[must_use]
    pub fn new(client: FetchClient, options: FetchOptions) -> Self {
        Self::with_base_urls(client, options, SUBMISSIONS_BASE_URL, ARCHIVES_BASE_URL)
    }

    /// Creates a locator with custom base URLs (for testing with wiremock).
    #[must_use]
    pub fn with_base_urls(
        client: FetchClient,
        options: FetchOptions,
        submissions_base: impl Into<String>,
        archives_base: impl Into<String>,
    ) -> Self {
        let mut options = options.with_header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&edgar_user_agent()) {
            options = options.with_header(USER_AGENT, agent);
        }
        Self {
            client,
            options,
            submissions_base: submissions_base.into(),
            archives_base: archives_base.into(),
            rate_limiter: None,
        }
    }

    /// Spaces index requests through a shared limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    fn submissions_url(&self, cik: &str) -> String {
        format!(
            "{}/CIK{:0>10}.json",
            self.submissions_base.trim_end_matches('/'),
            cik
        )
    }
}

impl std::fmt::Debug for EdgarLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarLocator")
            .field("submissions_base", &self.submissions_base)
            .field("archives_base", &self.archives_base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FilingLocator for EdgarLocator {
    fn name(&self) -> &'static str {
        "edgar"
    }

    #[instrument(skip(self, target), fields(locator = "edgar", target = %target))]
    async fn locate(&self, target: &FilingTarget) -> Result<Option<String>, LocateError> {
        let Some(cik) = target.company.sec_cik else {
            debug!("company has no SEC CIK; skipping EDGAR");
            return Ok(None);
        };

        let url = self.submissions_url(cik);
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire(&url).await;
        }

        let body = self.client.download_file(&url, &self.options).await?;
        let submissions: Submissions =
            serde_json::from_slice(&body).map_err(|e| LocateError::decode(&url, e))?;

        let recent = &submissions.filings.recent;
        debug!(filings = recent.form.len(), "submissions index loaded");

        Ok(select_filing(recent, target.year, target.quarter).map(|filing| {
            debug!(
                accession = filing.accession_number,
                filed = filing.filing_date,
                "matched EDGAR filing"
            );
            archive_url(&self.archives_base, cik, &filing)
        }))
    }
}
