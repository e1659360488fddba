//! Per-target outcomes and the run report.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::EngineError;
use crate::filing::{FilingTarget, Quarter};

/// Result of ingesting one filing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingOutcome {
    pub ticker: &'static str,
    pub year: i32,
    pub quarter: Quarter,
    /// Document URL, when a locator found one.
    pub source_url: Option<String>,
    /// Name of the locator that produced `source_url`.
    pub locator: Option<&'static str>,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub status: FilingStatus,
}

impl FilingOutcome {
    pub(crate) fn new(target: &FilingTarget, status: FilingStatus) -> Self {
        Self {
            ticker: target.company.ticker,
            year: target.year,
            quarter: target.quarter,
            source_url: None,
            locator: None,
            elapsed_ms: 0,
            status,
        }
    }
}

/// Terminal state of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FilingStatus {
    /// Document validated and written to disk.
    Stored {
        path: PathBuf,
        bytes: u64,
        detected_type: Option<&'static str>,
        sha256: String,
        /// Content scan warnings (only under the `flag` policy).
        warnings: Vec<String>,
    },
    /// No locator found a document for the period.
    NotFound,
    /// Document fetched but refused by validation or content policy.
    Rejected {
        reason: String,
        warnings: Vec<String>,
    },
    /// Locating, fetching or writing failed.
    Failed {
        error: String,
        /// Machine-readable error class (e.g. `retry_exhausted`).
        kind: &'static str,
    },
}

impl FilingStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stored { .. } => "stored",
            Self::NotFound => "not_found",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub stored: usize,
    pub not_found: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl IngestSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.stored + self.not_found + self.rejected + self.failed
    }
}

/// Outcomes of a run in target order, plus counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub summary: IngestSummary,
    pub outcomes: Vec<FilingOutcome>,
}

impl IngestReport {
    pub(crate) fn new(summary: IngestSummary, outcomes: Vec<FilingOutcome>) -> Self {
        Self { summary, outcomes }
    }

    /// Returns true when at least one target ended in `failed`.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// Writes the report as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Manifest`] if encoding fails or
    /// [`EngineError::Io`] if the file cannot be written.
    pub async fn write_manifest(&self, path: &Path) -> Result<(), EngineError> {
        let json = serde_json::to_vec_pretty(self).map_err(EngineError::Manifest)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| EngineError::io(parent, source))?;
        }
        tokio::fs::write(path, json)
            .await
            .map_err(|source| EngineError::io(path, source))?;

        info!(path = %path.display(), outcomes = self.outcomes.len(), "manifest written");
        Ok(())
    }
}
