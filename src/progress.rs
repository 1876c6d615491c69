//! Progress-callback trait: the reporting channel of a batch.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the batch processes each PDF. When no callback is configured the
//! batch reports through [`ConsoleReporter`], which prints the classic
//! progress lines to stdout and failure traces to stderr.
//!
//! # Example
//!
//! ```rust
//! use pdf2html::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, name: &str, pages: usize) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{name}: {pages} pages");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { converted: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FileError;
use crate::output::BatchReport;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Called by the batch converter as it processes each PDF.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// async entry point runs the batch on a blocking worker thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after discovery, before any file is processed.
    ///
    /// Not called when discovery finds nothing; see [`Self::on_no_files`].
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called instead of [`Self::on_batch_start`] when no file matched.
    fn on_no_files(&self, input_dir: &Path) {
        let _ = input_dir;
    }

    /// Called once the document's output directory exists, just before the
    /// document is opened.
    ///
    /// # Arguments
    /// * `name` : file name of the PDF (with extension)
    /// * `index`: 1-indexed position in the batch
    /// * `total`: number of files in the batch
    fn on_file_start(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called after each page document is written.
    fn on_page_written(&self, name: &str, page_num: usize, total_pages: usize) {
        let _ = (name, page_num, total_pages);
    }

    /// Called when every page of a document has been written.
    fn on_file_complete(&self, name: &str, pages: usize) {
        let _ = (name, pages);
    }

    /// Called when a document fails. The batch continues with the next file.
    fn on_file_error(&self, name: &str, error: &FileError) {
        let _ = (name, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, report: &BatchReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't want any reporting.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// Human-readable reporter: one progress line per event on the output
/// stream, failure diagnostics on the diagnostic stream.
///
/// ```text
/// Processing: intake.pdf
/// Successfully converted intake.pdf (2 pages)
/// Processing: broken.pdf
/// Failed to convert broken.pdf: cannot open 'files/broken.pdf': …
/// ```
pub struct ConsoleReporter {
    out: SharedWriter,
    diag: SharedWriter,
}

impl ConsoleReporter {
    /// Report to stdout, with diagnostics on stderr.
    pub fn new() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Report to arbitrary writers.
    pub fn with_writers(out: Box<dyn Write + Send>, diag: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            diag: Mutex::new(diag),
        }
    }

    fn line(&self, msg: &str) {
        if let Ok(mut w) = self.out.lock() {
            // Reporting must never fail the batch.
            let _ = writeln!(w, "{msg}");
            let _ = w.flush();
        }
    }

    fn trace(&self, error: &FileError) {
        if let Ok(mut w) = self.diag.lock() {
            let _ = writeln!(w, "{error:?}");
            for cause in error.chain().iter().skip(1) {
                let _ = writeln!(w, "  caused by: {cause}");
            }
            let _ = w.flush();
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionProgressCallback for ConsoleReporter {
    fn on_no_files(&self, input_dir: &Path) {
        self.line(&no_files_message(input_dir));
    }

    fn on_file_start(&self, name: &str, _index: usize, _total: usize) {
        self.line(&processing_message(name));
    }

    fn on_file_complete(&self, name: &str, pages: usize) {
        self.line(&success_message(name, pages));
    }

    fn on_file_error(&self, name: &str, error: &FileError) {
        self.line(&failure_message(name, error));
        self.trace(error);
    }
}

// ── Message texts ────────────────────────────────────────────────────────
// Shared with the CLI's progress-bar reporter so both print the same lines.

pub fn no_files_message(input_dir: &Path) -> String {
    format!("No PDF files found in {}", input_dir.display())
}

pub fn processing_message(name: &str) -> String {
    format!("Processing: {name}")
}

pub fn success_message(name: &str, pages: usize) -> String {
    format!("Successfully converted {name} ({pages} pages)")
}

pub fn failure_message(name: &str, error: &FileError) -> String {
    format!("Failed to convert {name}: {error}")
}
