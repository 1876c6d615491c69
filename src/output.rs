//! Result types describing what a batch did.

use crate::error::{FileError, FileErrorKind, Pdf2HtmlError};
use crate::pipeline::discover::ConversionJob;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one batch conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// One entry per discovered PDF, in discovery order.
    pub files: Vec<FileReport>,
    pub stats: BatchStats,
}

/// Outcome of one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Path of the source PDF.
    pub source: PathBuf,
    /// File name of the source PDF, as printed in progress lines.
    pub name: String,
    /// Directory receiving this document's pages.
    pub output_dir: PathBuf,
    /// Page count reported by the collaborator; `None` when opening failed.
    pub page_count: Option<usize>,
    /// Pages written before completion or failure.
    pub pages_written: usize,
    /// Error message; `None` on success.
    pub error: Option<String>,
    pub error_kind: Option<FileErrorKind>,
    pub duration_ms: u64,
}

impl FileReport {
    pub(crate) fn pending(job: &ConversionJob) -> Self {
        Self {
            source: job.source.clone(),
            name: job.name.clone(),
            output_dir: job.output_dir.clone(),
            page_count: None,
            pages_written: 0,
            error: None,
            error_kind: None,
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn failed(mut self, error: &FileError) -> Self {
        self.error = Some(error.to_string());
        self.error_kind = Some(error.kind());
        self
    }
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub converted_files: usize,
    pub failed_files: usize,
    /// Page documents written across all files, including partial ones.
    pub total_pages: usize,
    pub duration_ms: u64,
}

impl BatchReport {
    pub(crate) fn finish(&mut self, duration_ms: u64) {
        let converted = self.files.iter().filter(|f| f.is_success()).count();
        self.stats = BatchStats {
            total_files: self.files.len(),
            converted_files: converted,
            failed_files: self.files.len() - converted,
            total_pages: self.files.iter().map(|f| f.pages_written).sum(),
            duration_ms,
        };
    }

    /// Failed files, in discovery order.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_success())
    }

    /// Treat any failed file as an error.
    pub fn into_result(self) -> Result<BatchReport, Pdf2HtmlError> {
        if self.stats.failed_files > 0 {
            return Err(Pdf2HtmlError::PartialFailure {
                failed: self.stats.failed_files,
                total: self.stats.total_files,
            });
        }
        Ok(self)
    }
}
