use std::path::Path;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{ContentPolicy, FilingOutcome, FilingStatus, IngestSettings};
use crate::fetch::{FetchClient, RateLimiter};
use crate::filing::{FilingLocator, FilingTarget, locate_first};
use crate::user_agent;
use crate::validation::{check_file_content, file_extension, validate_file};

/// Extension used when the document URL has none.
const FALLBACK_EXTENSION: &str = "pdf";

/// Borrowed state shared by every target of a run.
pub(super) struct TargetContext<'a> {
    pub client: &'a FetchClient,
    pub locators: &'a [Box<dyn FilingLocator>],
    pub settings: &'a IngestSettings,
    pub rate_limiter: &'a RateLimiter,
    pub output_dir: &'a Path,
}

#[instrument(skip(ctx, target), fields(target = %target))]
pub(super) async fn ingest_target(
    ctx: &TargetContext<'_>,
    target: &FilingTarget,
) -> FilingOutcome {
    let started = Instant::now();

    let (located, status) = match locate_first(ctx.locators, target).await {
        Ok(Some(located)) => {
            let status = fetch_and_store(ctx, target, &located.url).await;
            (Some(located), status)
        }
        Ok(None) => {
            info!("no filing found");
            (None, FilingStatus::NotFound)
        }
        Err(error) => (
            None,
            FilingStatus::Failed {
                error: error.to_string(),
                kind: "locate_error",
            },
        ),
    };

    let mut outcome = FilingOutcome::new(target, status);
    if let Some(located) = located {
        outcome.source_url = Some(located.url);
        outcome.locator = Some(located.locator);
    }
    outcome.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    outcome
}

async fn fetch_and_store(
    ctx: &TargetContext<'_>,
    target: &FilingTarget,
    url: &str,
) -> FilingStatus {
    ctx.rate_limiter.acquire(url).await;

    let options = user_agent::for_document(ctx.settings.fetch.clone(), url);
    let bytes = match ctx.client.download_file(url, &options).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(url, error = %error, "document download failed");
            return FilingStatus::Failed {
                kind: error.kind(),
                error: error.to_string(),
            };
        }
    };

    let filename = format!("{}.{}", target.file_stem(), document_extension(url));
    let verdict = validate_file(&bytes, &filename);
    if !verdict.valid {
        let reason = verdict.error.unwrap_or_else(|| "validation failed".to_string());
        warn!(%filename, %reason, "document rejected by validation");
        return FilingStatus::Rejected {
            reason,
            warnings: Vec::new(),
        };
    }

    let safety = check_file_content(&bytes);
    if !safety.safe {
        match ctx.settings.content_policy {
            ContentPolicy::Reject => {
                warn!(%filename, warnings = ?safety.warnings, "unsafe content; rejecting");
                return FilingStatus::Rejected {
                    reason: "unsafe content detected".to_string(),
                    warnings: safety.warnings,
                };
            }
            ContentPolicy::Flag => {
                warn!(%filename, warnings = ?safety.warnings, "unsafe content flagged for review");
            }
        }
    }

    let path = ctx.output_dir.join(&filename);
    if let Err(error) = write_document(&path, &bytes).await {
        warn!(path = %path.display(), error = %error, "failed to write document");
        return FilingStatus::Failed {
            error: format!("failed to write {}: {error}", path.display()),
            kind: "write_error",
        };
    }

    let sha256 = format!("{:x}", Sha256::digest(&bytes));
    debug!(path = %path.display(), bytes = bytes.len(), %sha256, "document stored");

    FilingStatus::Stored {
        path,
        bytes: bytes.len() as u64,
        detected_type: verdict.detected_type,
        sha256,
        warnings: safety.warnings,
    }
}

/// Extension of the last path segment of `url`, or [`FALLBACK_EXTENSION`].
pub(super) fn document_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|segment| file_extension(&segment))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

async fn write_document(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // never leave a truncated filing under the final name
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, bytes).await?;
    tokio::fs::rename(&partial, path).await
}
