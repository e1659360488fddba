//! Finsight Core Library
//!
//! Ingestion core for financial filings of a fixed set of tracked companies:
//! locate a report, download it with bounded retries, check it is what it
//! claims to be, and store it with a run manifest.
//!
//! # Architecture
//!
//! - [`fetch`] - Retrying HTTP fetch with exponential backoff and deadlines
//! - [`validation`] - File size, extension and signature checks plus a
//!   content safety scan
//! - [`companies`] - Static registry of tracked companies
//! - [`filing`] - Filing targets and the locator chain (SEC EDGAR, IR pages)
//! - [`ingest`] - Concurrent batch engine producing per-target outcomes
//! - [`user_agent`] - Outbound User-Agent selection

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod companies;
pub mod fetch;
pub mod filing;
pub mod ingest;
pub mod user_agent;
pub mod validation;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use companies::{Category, Company, TRACKED_COMPANIES, company_by_ticker};
pub use fetch::{FetchClient, FetchError, FetchOptions, RateLimiter};
pub use filing::{FilingLocator, FilingTarget, Quarter, enumerate_targets};
pub use ingest::{
    ContentPolicy, FilingOutcome, FilingStatus, IngestEngine, IngestReport, IngestSettings,
};
pub use validation::{
    ContentSafetyVerdict, ValidationVerdict, check_file_content, validate_file,
};
