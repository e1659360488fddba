//! `fetch` command: retrying download of one URL, validated before writing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use finsight_core::fetch::{FetchClient, FetchOptions};
use finsight_core::user_agent;
use finsight_core::validation::{MAX_FILE_SIZE, check_file_content, validate_file};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

use crate::ProcessExit;
use crate::cli::{FetchArgs, RetryArgs};

/// Used when the URL path ends in `/` or cannot be parsed.
const FALLBACK_FILE_NAME: &str = "download.pdf";

/// Fetch options carrying the retry flags shared with `download`.
pub(crate) fn retry_options(retry: &RetryArgs) -> FetchOptions {
    FetchOptions::default()
        .with_max_retries(retry.max_retries)
        .with_initial_delay(Duration::from_millis(retry.initial_delay_ms))
        .with_attempt_timeout(Duration::from_secs(retry.timeout_secs))
}

pub async fn run_fetch_command(args: &FetchArgs, cancel: CancellationToken) -> Result<ProcessExit> {
    let destination = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(file_name_from_url(&args.url)));
    let filename = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut options = retry_options(&args.retry)
        .with_max_body_bytes(MAX_FILE_SIZE as u64)
        .with_cancellation(cancel);
    if let Some(secs) = args.deadline_secs {
        options = options.with_deadline(Duration::from_secs(secs));
    }
    let options = user_agent::for_document(options, &args.url);

    let bytes = FetchClient::new()
        .download_file(&args.url, &options)
        .await
        .with_context(|| format!("Failed to download {}", args.url))?;

    let verdict = validate_file(&bytes, &filename);
    if !verdict.valid {
        error!(
            url = %args.url,
            reason = verdict.error.as_deref().unwrap_or("validation failed"),
            "download rejected; nothing written"
        );
        return Ok(ProcessExit::Failure);
    }

    let safety = check_file_content(&bytes);
    if !safety.safe {
        if args.reject_unsafe {
            error!(url = %args.url, warnings = ?safety.warnings, "unsafe content; nothing written");
            return Ok(ProcessExit::Failure);
        }
        warn!(url = %args.url, warnings = ?safety.warnings, "unsafe content flagged for review");
    }

    write_output(&destination, &bytes).await?;
    info!(
        path = %destination.display(),
        bytes = bytes.len(),
        detected_type = verdict.detected_type.unwrap_or("unknown"),
        "saved"
    );
    println!("{}", destination.display());
    Ok(ProcessExit::Success)
}

fn file_name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, bytes)
        .await
        .with_context(|| format!("Failed to write '{}'", partial.display()))?;
    tokio::fs::rename(&partial, path)
        .await
        .with_context(|| format!("Failed to move download into '{}'", path.display()))
}
