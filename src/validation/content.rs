//! Advisory scan for script content embedded in documents.
//!
//! This is not a sanitizer. It reports what it finds and leaves the
//! store-or-reject decision to the caller.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Patterns checked, in order, with the warning emitted for each.
const UNSAFE_PATTERNS: [(&str, &str); 3] = [
    (r"(?i)<script", "embedded <script> tag detected"),
    (r"(?i)javascript:", "javascript: URI detected"),
    (r"(?i)eval\s*\(", "eval() call detected"),
];

#[allow(clippy::expect_used)]
static COMPILED_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    UNSAFE_PATTERNS
        .iter()
        .map(|(pattern, warning)| {
            (
                Regex::new(pattern).expect("static content pattern must compile"),
                *warning,
            )
        })
        .collect()
});

/// Outcome of [`check_file_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentSafetyVerdict {
    /// `true` when no pattern matched.
    pub safe: bool,
    /// One entry per matched pattern, in check order.
    pub warnings: Vec<String>,
}

/// Scans `bytes` (decoded as lossy UTF-8) for script tags, `javascript:`
/// URIs and `eval(` calls. Never fails.
#[must_use]
pub fn check_file_content(bytes: &[u8]) -> ContentSafetyVerdict {
    let text = String::from_utf8_lossy(bytes);

    let warnings: Vec<String> = COMPILED_PATTERNS
        .iter()
        .filter(|(regex, _)| regex.is_match(&text))
        .map(|(_, warning)| (*warning).to_string())
        .collect();

    if !warnings.is_empty() {
        debug!(?warnings, "unsafe content patterns found");
    }

    ContentSafetyVerdict {
        safe: warnings.is_empty(),
        warnings,
    }
}
