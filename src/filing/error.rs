//! Error type for filing locators.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors raised while locating a filing URL.
///
/// "No filing found" is not an error; locators return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The index or listing page could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The index payload was not the expected JSON.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LocateError {
    pub(crate) fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}
