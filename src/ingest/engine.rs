use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use super::pipeline::{TargetContext, ingest_target};
use super::{FilingOutcome, FilingStatus, IngestReport, IngestSettings, IngestSummary};
use crate::fetch::{FetchClient, RateLimiter};
use crate::filing::{FilingLocator, FilingTarget};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Callback invoked once per finished target, from the task that ran it.
pub type OutcomeCallback = Arc<dyn Fn(&FilingOutcome) + Send + Sync>;

/// Errors that abort a whole ingest run.
///
/// Per-target failures never surface here; they become
/// [`FilingStatus::Failed`] outcomes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// An ingest task panicked or was cancelled.
    #[error("ingest task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Filesystem error on the output directory or manifest.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run report could not be encoded.
    #[error("failed to encode manifest: {0}")]
    Manifest(#[source] serde_json::Error),
}

impl EngineError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Live counters for a run, updated from concurrent tasks.
#[derive(Debug, Default)]
pub struct IngestStats {
    stored: AtomicUsize,
    not_found: AtomicUsize,
    rejected: AtomicUsize,
    failed: AtomicUsize,
}

impl IngestStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stored(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn not_found(&self) -> usize {
        self.not_found.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the number of targets finished so far.
    #[must_use]
    pub fn total(&self) -> usize {
        self.stored() + self.not_found() + self.rejected() + self.failed()
    }

    fn record(&self, status: &FilingStatus) {
        let counter = match status {
            FilingStatus::Stored { .. } => &self.stored,
            FilingStatus::NotFound => &self.not_found,
            FilingStatus::Rejected { .. } => &self.rejected,
            FilingStatus::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            stored: self.stored(),
            not_found: self.not_found(),
            rejected: self.rejected(),
            failed: self.failed(),
        }
    }
}

/// Concurrent ingest engine.
///
/// # Concurrency Model
///
/// - Each target runs in its own Tokio task
/// - A semaphore permit is acquired before spawning, so at most
///   `concurrency` targets are in flight
/// - Requests to the same host are spaced by the shared [`RateLimiter`]
/// - Outcomes are collected in target order regardless of completion order
pub struct IngestEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    settings: Arc<IngestSettings>,
    rate_limiter: Arc<RateLimiter>,
    on_outcome: Option<OutcomeCallback>,
}

impl std::fmt::Debug for IngestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestEngine")
            .field("concurrency", &self.concurrency)
            .field("settings", &self.settings)
            .field("rate_limiter", &self.rate_limiter)
            .field("on_outcome", &self.on_outcome.is_some())
            .finish_non_exhaustive()
    }
}

impl IngestEngine {
    /// Creates an engine running at most `concurrency` targets at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use finsight_core::fetch::RateLimiter;
    /// use finsight_core::ingest::{IngestEngine, IngestSettings};
    ///
    /// let rate_limiter = Arc::new(RateLimiter::new(Duration::from_millis(1500)));
    /// let engine = IngestEngine::new(10, IngestSettings::default(), rate_limiter).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug", skip(settings, rate_limiter))]
    pub fn new(
        concurrency: usize,
        settings: IngestSettings,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_retries = settings.fetch.max_retries,
            content_policy = %settings.content_policy,
            rate_limit_ms = rate_limiter.spacing().as_millis(),
            rate_limit_disabled = rate_limiter.is_disabled(),
            "creating ingest engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            settings: Arc::new(settings),
            rate_limiter,
            on_outcome: None,
        })
    }

    /// Registers a callback invoked as each target finishes.
    #[must_use]
    pub fn with_progress(mut self, callback: OutcomeCallback) -> Self {
        self.on_outcome = Some(callback);
        self
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Ingests every target and returns the outcomes in target order.
    ///
    /// `output_dir` is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the output directory cannot be created,
    /// [`EngineError::SemaphoreClosed`] if the semaphore is closed, or
    /// [`EngineError::Task`] if a task panicked.
    ///
    /// Individual target failures do NOT cause this method to error.
    #[instrument(
        skip(self, targets, locators, client),
        fields(target_count = targets.len(), output_dir = %output_dir.display())
    )]
    pub async fn run(
        &self,
        targets: Vec<FilingTarget>,
        locators: Vec<Box<dyn FilingLocator>>,
        client: &FetchClient,
        output_dir: &Path,
    ) -> Result<IngestReport, EngineError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| EngineError::io(output_dir, source))?;

        let stats = Arc::new(IngestStats::new());
        let locators: Arc<[Box<dyn FilingLocator>]> = locators.into();
        let mut handles = Vec::with_capacity(targets.len());

        info!(locators = locators.len(), "starting ingest run");

        for target in targets {
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let client = client.clone();
            let locators = Arc::clone(&locators);
            let settings = Arc::clone(&self.settings);
            let rate_limiter = Arc::clone(&self.rate_limiter);
            let output_dir = output_dir.to_path_buf();
            let stats = Arc::clone(&stats);
            let on_outcome = self.on_outcome.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;

                let ctx = TargetContext {
                    client: &client,
                    locators: &locators,
                    settings: &settings,
                    rate_limiter: &rate_limiter,
                    output_dir: &output_dir,
                };
                let outcome = ingest_target(&ctx, &target).await;

                stats.record(&outcome.status);
                if let Some(callback) = &on_outcome {
                    callback(&outcome);
                }
                outcome
            }));
        }

        debug!(task_count = handles.len(), "waiting for ingest tasks");

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await?);
        }

        let summary = stats.summary();
        info!(
            stored = summary.stored,
            not_found = summary.not_found,
            rejected = summary.rejected,
            failed = summary.failed,
            total = summary.total(),
            "ingest run complete"
        );

        Ok(IngestReport::new(summary, outcomes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::companies::company_by_ticker;
    use crate::fetch::FetchError;
    use crate::filing::{LocateError, Quarter, enumerate_targets};

    fn test_rate_limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(Duration::from_millis(100)))
    }

    /// Finds nothing for even years and errors for odd years.
    struct ParityLocator;

    #[async_trait]
    impl FilingLocator for ParityLocator {
        fn name(&self) -> &'static str {
            "parity"
        }

        async fn locate(&self, target: &FilingTarget) -> Result<Option<String>, LocateError> {
            if target.year % 2 == 0 {
                Ok(None)
            } else {
                Err(FetchError::invalid_url("bad://index").into())
            }
        }
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_engine_new_valid_concurrency() {
        for value in [1, 10, 100] {
            let engine =
                IngestEngine::new(value, IngestSettings::default(), test_rate_limiter()).unwrap();
            assert_eq!(engine.concurrency(), value);
        }
    }

    #[test]
    fn test_engine_new_invalid_concurrency() {
        for value in [0, 101] {
            let result = IngestEngine::new(value, IngestSettings::default(), test_rate_limiter());
            assert!(matches!(
                result,
                Err(EngineError::InvalidConcurrency { value: v }) if v == value
            ));
        }
    }

    #[test]
    fn test_engine_error_display() {
        let msg = EngineError::InvalidConcurrency { value: 0 }.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
    }

    // ==================== Stats Tests ====================

    #[test]
    fn test_stats_record_each_status() {
        let stats = IngestStats::new();
        stats.record(&FilingStatus::NotFound);
        stats.record(&FilingStatus::NotFound);
        stats.record(&FilingStatus::Failed {
            error: "x".to_string(),
            kind: "timeout",
        });

        assert_eq!(stats.not_found(), 2);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.stored(), 0);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_stats_thread_safe() {
        let stats = Arc::new(IngestStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record(&FilingStatus::NotFound);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.not_found(), 800);
    }

    // ==================== Run Tests ====================

    #[tokio::test]
    async fn test_run_isolates_failures_and_keeps_target_order() {
        let dir = tempfile::tempdir().unwrap();
        let msft = company_by_ticker("MSFT").unwrap();
        let targets = enumerate_targets(&[msft], &[2023, 2024, 2025], &[Quarter::Fy]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_callback = Arc::clone(&seen);
        let engine = IngestEngine::new(2, IngestSettings::default(), test_rate_limiter())
            .unwrap()
            .with_progress(Arc::new(move |outcome: &FilingOutcome| {
                seen_in_callback.lock().unwrap().push(outcome.year);
            }));

        let report = engine
            .run(
                targets,
                vec![Box::new(ParityLocator)],
                &FetchClient::new(),
                dir.path(),
            )
            .await
            .unwrap();

        let years: Vec<_> = report.outcomes.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2023, 2024, 2025]);
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.not_found, 1);
        assert!(report.has_failures());
        assert!(matches!(
            report.outcomes[0].status,
            FilingStatus::Failed { kind: "locate_error", .. }
        ));
        assert_eq!(report.outcomes[1].status, FilingStatus::NotFound);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_run_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/filings");
        let engine =
            IngestEngine::new(1, IngestSettings::default(), test_rate_limiter()).unwrap();

        let report = engine
            .run(Vec::new(), Vec::new(), &FetchClient::new(), &output)
            .await
            .unwrap();

        assert!(output.is_dir());
        assert_eq!(report.summary.total(), 0);
    }
}
