//! Shared User-Agent strings for outbound requests.
//!
//! SEC EDGAR rejects anonymous clients: its fair-access policy requires a
//! User-Agent naming the tool and a contact address. Company IR sites, on the
//! other hand, often serve bot-detection pages to non-browser agents.

use reqwest::header::{HeaderValue, USER_AGENT};

use crate::fetch::{FetchOptions, extract_domain};

/// Contact address advertised to SEC EDGAR.
const EDGAR_CONTACT: &str = "admin@finsight.auto";

/// Browser User-Agent for investor-relations pages.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for the fetch client (identifies the tool).
#[must_use]
pub(crate) fn default_fetch_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("finsight/{version} (financial-research-tool)")
}

/// User-Agent for SEC EDGAR requests (tool name plus contact address).
#[must_use]
pub fn edgar_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("finsight/{version} {EDGAR_CONTACT}")
}

/// Adds the EDGAR User-Agent when `url` points at an SEC host; SEC archive
/// hosts refuse requests without a contact address.
#[must_use]
pub fn for_document(options: FetchOptions, url: &str) -> FetchOptions {
    let domain = extract_domain(url);
    if domain != "sec.gov" && !domain.ends_with(".sec.gov") {
        return options;
    }
    match HeaderValue::from_str(&edgar_user_agent()) {
        Ok(agent) => options.with_header(USER_AGENT, agent),
        Err(_) => options,
    }
}
