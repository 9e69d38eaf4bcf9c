//! Error types for the pdfharvest library.
//!
//! Every failure in the pipeline is fatal: nothing is retried and no partial
//! [`crate::output::ExtractionResult`] is ever returned. A single enum,
//! [`HarvestError`], carries the cause verbatim up to the invocation
//! boundary, and [`HarvestError::kind`] folds the variants into the coarse
//! taxonomy callers branch on (fetch, parse, filesystem).

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`HarvestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, transport or non-2xx HTTP status while downloading.
    Fetch,
    /// The document (or an image inside it) cannot be opened or decoded.
    Parse,
    /// Filesystem failure while writing artifacts.
    Io,
    /// Invalid configuration or an unusable pdfium library.
    Config,
    /// Unexpected internal failure (panicked worker, runtime setup).
    Internal,
}

/// All errors returned by the pdfharvest library.
#[derive(Debug, Error)]
pub enum HarvestError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The URL is empty or not an HTTP/HTTPS URL.
    #[error("Invalid URL '{url}': expected an http:// or https:// URL")]
    InvalidUrl { url: String },

    /// Transport-level failure (DNS, connection refused, broken body).
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The server answered with a non-success status.
    #[error("Download of '{url}' failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// Input document was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Reading a page (or its text layer) failed.
    #[error("Failed to read page {page}: {detail}")]
    PageUnreadable { page: usize, detail: String },

    /// An embedded image could not be decoded into pixels.
    #[error("Failed to decode image {index} on page {page}: {detail}")]
    ImageDecode {
        page: usize,
        index: usize,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read an artifact back from disk.
    #[error("Failed to read '{path}': {source}")]
    ArtifactReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact exists but does not hold the expected JSON.
    #[error("Malformed artifact '{path}': {source}")]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// PNG encoding of an extracted image failed.
    #[error("Failed to encode '{path}': {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library in the current directory."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HarvestError {
    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarvestError::InvalidUrl { .. }
            | HarvestError::DownloadFailed { .. }
            | HarvestError::DownloadTimeout { .. }
            | HarvestError::HttpStatus { .. } => ErrorKind::Fetch,

            HarvestError::FileNotFound { .. }
            | HarvestError::NotAPdf { .. }
            | HarvestError::CorruptPdf { .. }
            | HarvestError::PasswordRequired { .. }
            | HarvestError::WrongPassword { .. }
            | HarvestError::PageUnreadable { .. }
            | HarvestError::ImageDecode { .. } => ErrorKind::Parse,

            HarvestError::CreateDirFailed { .. }
            | HarvestError::OutputWriteFailed { .. }
            | HarvestError::ArtifactReadFailed { .. }
            | HarvestError::MalformedArtifact { .. }
            | HarvestError::ImageEncode { .. } => ErrorKind::Io,

            HarvestError::InvalidConfig(_) | HarvestError::PdfiumBindingFailed(_) => {
                ErrorKind::Config
            }

            HarvestError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display() {
        let e = HarvestError::HttpStatus {
            url: "https://example.com/a.pdf".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("example.com"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn timeout_display() {
        let e = HarvestError::DownloadTimeout {
            url: "https://example.com/a.pdf".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn parse_errors_classified() {
        let e = HarvestError::NotAPdf {
            path: "x.pdf".into(),
            magic: b"<htm".to_vec(),
        };
        assert_eq!(e.kind(), ErrorKind::Parse);

        let e = HarvestError::ImageDecode {
            page: 2,
            index: 1,
            detail: "bad samples".into(),
        };
        assert!(e.to_string().contains("page 2"));
        assert_eq!(e.kind(), ErrorKind::Parse);
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;

        let e = HarvestError::OutputWriteFailed {
            path: "out/image1.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.source().is_some());
        assert!(e.to_string().contains("image1.png"));
    }
}
