//! Error types for the pdf2html library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2HtmlError`] is **fatal**: the batch cannot proceed at all (the
//!   output root cannot be created, PDFium cannot be bound, the discovery
//!   pattern is malformed). Returned as `Err(Pdf2HtmlError)` from the
//!   top-level `convert*` functions.
//!
//! * [`FileError`] is **non-fatal**: a single PDF failed (corrupt file,
//!   unwritable page) but the rest of the batch is fine. Recorded in
//!   [`crate::output::FileReport`] and reported through the progress
//!   callback; never propagated past the per-file boundary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2html library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2HtmlError {
    // ── Output errors ─────────────────────────────────────────────────────
    /// The top-level output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Discovery errors ──────────────────────────────────────────────────
    /// The file pattern is not a valid glob.
    #[error("Invalid file pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// A document or page name supplied by the caller is not acceptable.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// The requested converted document or page does not exist.
    #[error("No converted page at '{path}'")]
    DocumentNotFound { path: PathBuf },

    /// A converted page or the output root could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch outcome ─────────────────────────────────────────────────────
    /// Some files converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed to convert")]
    PartialFailure { failed: usize, total: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`FileError`], so callers can decide a retry
/// policy without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    /// The collaborator could not open the document.
    Open,
    /// A page of an opened document could not be extracted.
    Render,
    /// A directory or page file could not be written.
    Write,
}

/// A non-fatal error for a single PDF.
///
/// The batch continues with the next file.
#[derive(Debug, Error)]
pub enum FileError {
    /// The document could not be opened (unreadable, corrupt, encrypted).
    #[error("cannot open '{path}': {detail}")]
    Open { path: PathBuf, detail: String },

    /// A page could not be extracted from an opened document.
    #[error("page {page}: extraction failed: {detail}")]
    Render { page: usize, detail: String },

    /// The per-document output directory could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A page document could not be written.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub fn kind(&self) -> FileErrorKind {
        match self {
            FileError::Open { .. } => FileErrorKind::Open,
            FileError::Render { .. } => FileErrorKind::Render,
            FileError::CreateDir { .. } | FileError::Write { .. } => FileErrorKind::Write,
        }
    }

    /// The error followed by its `source()` chain, one entry per cause.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut cause = std::error::Error::source(self);
        while let Some(e) = cause {
            out.push(e.to_string());
            cause = e.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn partial_failure_display() {
        let e = Pdf2HtmlError::PartialFailure {
            failed: 1,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn binding_failure_mentions_env_var() {
        let e = Pdf2HtmlError::PdfiumBindingFailed("no library".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
        assert!(e.to_string().contains("no library"));
    }

    #[test]
    fn kinds_classify_variants() {
        let open = FileError::Open {
            path: "a.pdf".into(),
            detail: "bad header".into(),
        };
        let render = FileError::Render {
            page: 2,
            detail: "x".into(),
        };
        let mkdir = FileError::CreateDir {
            path: "out/a".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let write = FileError::Write {
            path: "out/a/page_1.html".into(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(open.kind(), FileErrorKind::Open);
        assert_eq!(render.kind(), FileErrorKind::Render);
        assert_eq!(mkdir.kind(), FileErrorKind::Write);
        assert_eq!(write.kind(), FileErrorKind::Write);
    }

    #[test]
    fn chain_includes_io_source() {
        let e = FileError::Write {
            path: "out/a/page_1.html".into(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        let chain = e.chain();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].contains("page_1.html"));
        assert_eq!(chain[1], "disk full");
    }

    #[test]
    fn kind_serialises_snake_case() {
        let json = serde_json::to_string(&FileErrorKind::Write).unwrap();
        assert_eq!(json, "\"write\"");
    }
}
