//! File validation for downloaded and uploaded filings.
//!
//! Two independent checks, both pure functions of their input:
//!
//! - [`validate_file`] enforces the size cap, the extension allow-list and
//!   agreement between the declared extension and the sniffed byte
//!   signature.
//! - [`check_file_content`] scans decoded text for embedded script content
//!   and reports what it finds without deciding anything.
//!
//! # Example
//!
//! ```
//! use finsight_core::validation::validate_file;
//!
//! let verdict = validate_file(b"%PDF-1.7 ...", "2024_Q1_NVDA.pdf");
//! assert!(verdict.valid);
//! assert_eq!(verdict.detected_type, Some("application/pdf"));
//! ```

mod content;
mod signature;

use serde::Serialize;
use tracing::debug;

pub use content::{ContentSafetyVerdict, check_file_content};
pub use signature::{DocumentKind, Signature, file_extension};

/// Largest accepted file, in bytes (500 MiB).
pub const MAX_FILE_SIZE: usize = 500 * 1024 * 1024;

/// Extensions accepted by [`validate_file`], lowercase, without the dot.
pub const ALLOWED_EXTENSIONS: [&str; 10] = [
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "html", "htm", "txt",
];

/// Outcome of [`validate_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    /// MIME type derived from the content (or the declared text type).
    pub detected_type: Option<&'static str>,
    /// Human-readable rejection reason; `None` when valid.
    pub error: Option<String>,
}

impl ValidationVerdict {
    fn accepted(detected_type: &'static str) -> Self {
        Self {
            valid: true,
            detected_type: Some(detected_type),
            error: None,
        }
    }

    fn rejected(detected_type: Option<&'static str>, error: String) -> Self {
        debug!(error = %error, ?detected_type, "file rejected");
        Self {
            valid: false,
            detected_type,
            error: Some(error),
        }
    }
}

/// Validates `bytes` against the extension of `filename`.
///
/// Checks run in order and the first failure wins: size, extension,
/// then signature agreement. Plain-text kinds (`txt`, `html`, `htm`) skip
/// signature enforcement.
#[must_use]
pub fn validate_file(bytes: &[u8], filename: &str) -> ValidationVerdict {
    if bytes.len() > MAX_FILE_SIZE {
        return ValidationVerdict::rejected(
            None,
            format!(
                "file too large: {} bytes exceeds the {} MB limit",
                bytes.len(),
                MAX_FILE_SIZE / (1024 * 1024)
            ),
        );
    }

    let extension = file_extension(filename);
    let Some(kind) = extension.as_deref().and_then(DocumentKind::from_extension) else {
        let shown = extension.map_or_else(|| "(none)".to_string(), |ext| format!(".{ext}"));
        return ValidationVerdict::rejected(
            None,
            format!(
                "unsupported file type: {shown} (allowed: {})",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        );
    };

    let sniffed = Signature::sniff(bytes);
    let detected = sniffed.map(|signature| signature.detected_mime(kind));

    match kind.expected_signature() {
        None => ValidationVerdict::accepted(detected.unwrap_or_else(|| kind.mime_type())),
        Some(expected) if sniffed == Some(expected) => {
            ValidationVerdict::accepted(detected.unwrap_or_else(|| kind.mime_type()))
        }
        Some(_) => ValidationVerdict::rejected(
            detected,
            format!(
                "file type mismatch: {filename} declares {} but content is {}",
                kind.mime_type(),
                detected.unwrap_or("unrecognised")
            ),
        ),
    }
}
