//! `download` command: locate, fetch, validate and store filings.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use finsight_core::companies::{Company, TRACKED_COMPANIES, company_by_ticker};
use finsight_core::fetch::{FetchClient, RateLimiter};
use finsight_core::filing::{ALL_QUARTERS, FilingTarget, default_locators, enumerate_targets};
use finsight_core::ingest::{IngestEngine, IngestReport, IngestSettings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::fetch::retry_options;
use crate::ProcessExit;
use crate::app::{exit_handler, progress, terminal};
use crate::cli::DownloadArgs;

/// Output directory when neither the flag nor the config file sets one.
const DEFAULT_OUTPUT_DIR: &str = "filings";

/// Manifest file name inside the output directory.
const MANIFEST_FILE: &str = "manifest.json";

pub async fn run_download_command(
    args: &DownloadArgs,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<ProcessExit> {
    let targets = build_targets(args)?;
    if targets.is_empty() {
        info!("no filing targets selected");
        return Ok(ProcessExit::Success);
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let settings = IngestSettings::new(
        retry_options(&args.retry).with_cancellation(cancel),
        args.content_policy(),
    );
    let rate_limiter = if args.rate_limit == 0 {
        debug!("rate limiting disabled");
        Arc::new(RateLimiter::disabled())
    } else {
        debug!(rate_limit_ms = args.rate_limit, "rate limiting enabled");
        Arc::new(RateLimiter::new(Duration::from_millis(args.rate_limit)))
    };

    let client = FetchClient::new();
    let locators = default_locators(&client, &settings.fetch, &rate_limiter);

    let show_progress = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let bar = progress::new_progress_bar(show_progress, targets.len());

    info!(
        targets = targets.len(),
        output_dir = %output_dir.display(),
        "starting filing download"
    );

    let engine = IngestEngine::new(usize::from(args.concurrency), settings, rate_limiter)?
        .with_progress(progress::outcome_callback(&bar));
    let report = engine.run(targets, locators, &client, &output_dir).await?;
    bar.finish_and_clear();

    let manifest_path = output_dir.join(MANIFEST_FILE);
    report
        .write_manifest(&manifest_path)
        .await
        .with_context(|| format!("Failed to write manifest '{}'", manifest_path.display()))?;

    print_summary(&report);
    Ok(exit_handler::determine_exit_outcome(&report.summary))
}

fn build_targets(args: &DownloadArgs) -> Result<Vec<FilingTarget>> {
    let companies = select_companies(args)?;
    let quarters = if args.quarters.is_empty() {
        ALL_QUARTERS.to_vec()
    } else {
        args.quarters.clone()
    };
    Ok(enumerate_targets(&companies, &args.years, &quarters))
}

/// Explicit tickers (in the order given) or the whole registry, narrowed
/// by category when one is set.
fn select_companies(args: &DownloadArgs) -> Result<Vec<&'static Company>> {
    let mut companies = Vec::new();
    if args.tickers.is_empty() {
        companies.extend(TRACKED_COMPANIES.iter());
    } else {
        for ticker in &args.tickers {
            let Some(company) = company_by_ticker(ticker) else {
                bail!("Unknown ticker '{ticker}'. Run `finsight companies` to list tracked tickers");
            };
            if !companies.contains(&company) {
                companies.push(company);
            }
        }
    }
    if let Some(category) = args.category {
        companies.retain(|company| company.category == category);
    }
    Ok(companies)
}

fn print_summary(report: &IngestReport) {
    let summary = &report.summary;
    println!(
        "{} filings: {} stored, {} not found, {} rejected, {} failed",
        summary.total(),
        summary.stored,
        summary.not_found,
        summary.rejected,
        summary.failed
    );
}
