//! Locator trait and the fallback chain.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{EdgarLocator, FilingTarget, IrPageLocator, LocateError};
use crate::fetch::{FetchClient, FetchOptions, RateLimiter};

/// Strategy that resolves a [`FilingTarget`] to a document URL.
///
/// Uses `async_trait` so locators can be held as `Box<dyn FilingLocator>`
/// in an ordered chain.
#[async_trait]
pub trait FilingLocator: Send + Sync {
    /// Short name used in logs and the run manifest.
    fn name(&self) -> &'static str;

    /// Returns the document URL, or `Ok(None)` when this source has no
    /// matching filing.
    async fn locate(&self, target: &FilingTarget) -> Result<Option<String>, LocateError>;
}

/// A URL found by a locator in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub url: String,
    pub locator: &'static str,
}

/// Builds the standard chain: EDGAR first, then the IR page scrape.
#[must_use]
pub fn default_locators(
    client: &FetchClient,
    options: &FetchOptions,
    rate_limiter: &Arc<RateLimiter>,
) -> Vec<Box<dyn FilingLocator>> {
    vec![
        Box::new(
            EdgarLocator::new(client.clone(), options.clone())
                .with_rate_limiter(Arc::clone(rate_limiter)),
        ),
        Box::new(
            IrPageLocator::new(client.clone(), options.clone())
                .with_rate_limiter(Arc::clone(rate_limiter)),
        ),
    ]
}

/// Tries each locator in order and returns the first URL found.
///
/// A failing locator is logged and skipped. When no locator finds a URL the
/// last error seen is returned, or `Ok(None)` if every locator simply came
/// up empty.
///
/// # Errors
///
/// Returns the last [`LocateError`] when nothing was found and at least one
/// locator failed.
pub async fn locate_first(
    locators: &[Box<dyn FilingLocator>],
    target: &FilingTarget,
) -> Result<Option<Located>, LocateError> {
    let mut last_error = None;

    for locator in locators {
        match locator.locate(target).await {
            Ok(Some(url)) => {
                debug!(locator = locator.name(), %url, "filing located");
                return Ok(Some(Located {
                    url,
                    locator: locator.name(),
                }));
            }
            Ok(None) => debug!(locator = locator.name(), "no filing from locator"),
            Err(error) => {
                warn!(
                    locator = locator.name(),
                    target = %target,
                    error = %error,
                    "locator failed; trying next"
                );
                last_error = Some(error);
            }
        }
    }

    match last_error {
        Some(error) => Err(error),
        None => Ok(None),
    }
}
