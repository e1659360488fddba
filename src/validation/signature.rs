//! Declared document kinds and byte-signature sniffing.

use std::ffi::OsStr;
use std::path::Path;

/// `%PDF`
const PDF_MAGIC: &[u8] = b"%PDF";

/// Local file header of a ZIP archive (OOXML containers).
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE2 compound document header (legacy Office formats).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Binary signature recognised from the leading bytes of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// `%PDF`
    Pdf,
    /// `PK\x03\x04` (docx, xlsx, pptx)
    Zip,
    /// OLE compound file (doc, xls, ppt)
    Ole,
}

impl Signature {
    /// Sniffs the signature of `bytes`, if any is recognised.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PDF_MAGIC) {
            Some(Self::Pdf)
        } else if bytes.starts_with(ZIP_MAGIC) {
            Some(Self::Zip)
        } else if bytes.starts_with(OLE_MAGIC) {
            Some(Self::Ole)
        } else {
            None
        }
    }

    /// MIME type reported for this signature when the file is declared as `kind`.
    ///
    /// Container formats (ZIP, OLE) are ambiguous on their own; the declared
    /// kind picks the concrete Office type when it belongs to the same family.
    #[must_use]
    pub fn detected_mime(self, kind: DocumentKind) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Zip if kind.expected_signature() == Some(Self::Zip) => kind.mime_type(),
            Self::Zip => "application/zip",
            Self::Ole if kind.expected_signature() == Some(Self::Ole) => kind.mime_type(),
            Self::Ole => "application/x-ole-storage",
        }
    }
}

/// Document kinds accepted for upload and download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
    Html,
    Txt,
}

impl DocumentKind {
    /// Maps a file extension (without the dot, any case) to a kind.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let kind = match extension.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" => Self::Doc,
            "docx" => Self::Docx,
            "xls" => Self::Xls,
            "xlsx" => Self::Xlsx,
            "ppt" => Self::Ppt,
            "pptx" => Self::Pptx,
            "html" | "htm" => Self::Html,
            "txt" => Self::Txt,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical MIME type for the kind.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Ppt => "application/vnd.ms-powerpoint",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Html => "text/html",
            Self::Txt => "text/plain",
        }
    }

    /// Signature the content must carry, or `None` for plain-text kinds.
    #[must_use]
    pub fn expected_signature(self) -> Option<Signature> {
        match self {
            Self::Pdf => Some(Signature::Pdf),
            Self::Docx | Self::Xlsx | Self::Pptx => Some(Signature::Zip),
            Self::Doc | Self::Xls | Self::Ppt => Some(Signature::Ole),
            Self::Html | Self::Txt => None,
        }
    }
}

/// Lowercased extension of `filename`, if it has one.
#[must_use]
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}
