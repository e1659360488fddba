//! Concurrent batch ingestion of filings.
//!
//! The [`IngestEngine`] runs one task per [`FilingTarget`](crate::filing::FilingTarget),
//! bounded by a semaphore. Each task walks the pipeline
//! locate -> fetch -> validate -> content scan -> write and produces a
//! [`FilingOutcome`]. A failing target never affects its siblings.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use finsight_core::companies::company_by_ticker;
//! use finsight_core::fetch::{FetchClient, RateLimiter};
//! use finsight_core::filing::{Quarter, default_locators, enumerate_targets};
//! use finsight_core::ingest::{IngestEngine, IngestSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FetchClient::new();
//! let settings = IngestSettings::default();
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1500)));
//! let locators = default_locators(&client, &settings.fetch, &limiter);
//!
//! let nvda = company_by_ticker("NVDA").ok_or("unknown ticker")?;
//! let targets = enumerate_targets(&[nvda], &[2024], &[Quarter::Q1]);
//!
//! let engine = IngestEngine::new(4, settings, limiter)?;
//! let report = engine.run(targets, locators, &client, Path::new("./filings")).await?;
//! report.write_manifest(Path::new("./filings/manifest.json")).await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod outcome;
mod pipeline;

pub use engine::{
    DEFAULT_CONCURRENCY, EngineError, IngestEngine, IngestStats, MAX_CONCURRENCY,
    MIN_CONCURRENCY, OutcomeCallback,
};
pub use outcome::{FilingOutcome, FilingStatus, IngestReport, IngestSummary};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fetch::FetchOptions;
use crate::validation::MAX_FILE_SIZE;

/// What to do with a document whose content scan found script markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPolicy {
    /// Store the file and record the warnings for manual review.
    #[default]
    Flag,
    /// Do not store the file; record a `rejected` outcome.
    Reject,
}

impl fmt::Display for ContentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("flag"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for ContentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(Self::Flag),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "invalid content policy '{other}' (expected flag or reject)"
            )),
        }
    }
}

/// Per-run settings shared by every ingest task.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Options for document downloads. The body cap defaults to the
    /// validator's size limit so oversized documents are never buffered.
    pub fetch: FetchOptions,
    pub content_policy: ContentPolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self::new(FetchOptions::default(), ContentPolicy::default())
    }
}

impl IngestSettings {
    #[must_use]
    pub fn new(fetch: FetchOptions, content_policy: ContentPolicy) -> Self {
        let fetch = if fetch.max_body_bytes.is_some() {
            fetch
        } else {
            fetch.with_max_body_bytes(MAX_FILE_SIZE as u64)
        };
        Self {
            fetch,
            content_policy,
        }
    }
}
