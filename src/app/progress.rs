//! Progress bar for download runs.

use std::sync::Arc;
use std::time::Duration;

use finsight_core::ingest::{FilingOutcome, OutcomeCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates the bar; hidden when `visible` is false so callers need no branching.
pub(crate) fn new_progress_bar(visible: bool, total: usize) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Advances `bar` once per finished filing.
pub(crate) fn outcome_callback(bar: &ProgressBar) -> OutcomeCallback {
    let bar = bar.clone();
    Arc::new(move |outcome: &FilingOutcome| {
        bar.inc(1);
        bar.set_message(progress_message(outcome));
    })
}

fn progress_message(outcome: &FilingOutcome) -> String {
    format!(
        "{} {} {} {}",
        outcome.ticker,
        outcome.year,
        outcome.quarter,
        outcome.status.label()
    )
}
