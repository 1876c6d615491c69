//! # pdf2html
//!
//! Batch-convert a directory of PDF files into per-page HTML documents.
//!
//! ## Why this crate?
//!
//! Scanned and generated forms are easiest to reuse on the web when every page
//! keeps its exact layout. Instead of reflowing text, this crate asks pdfium
//! where each text segment and image sits on the page and writes one
//! standalone HTML document per page with every element absolutely
//! positioned. The page container is sized in points, so a page prints at the
//! same size as the source PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input_dir
//!  │
//!  ├─ 1. Discover  glob `*.pdf` directly inside the input directory
//!  ├─ 2. Open      load each PDF via pdfium (blocking, spawn_blocking)
//!  ├─ 3. Extract   text segments + image objects → positioned HTML fragment
//!  ├─ 4. Encode    images → base64 PNG data URIs
//!  ├─ 5. Shell     wrap the fragment in a styled page document
//!  └─ 6. Write     output_dir/<name>/page_<n>.html + per-file report
//! ```
//!
//! A PDF that fails to open or convert is reported and skipped; the batch
//! always moves on to the next file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2html::{convert_dir, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads ./files/*.pdf, writes ./files/html/<name>/page_<n>.html
//!     let config = ConversionConfig::default();
//!     let report = convert_dir(&config).await?;
//!     for file in report.failures() {
//!         eprintln!("{}: {}", file.name, file.error.as_deref().unwrap_or(""));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2html` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2html = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirement
//!
//! The pdfium shared library must be available at run time. Set
//! `PDFIUM_LIB_PATH`, place the library in the working directory, or install
//! it system-wide. An empty input directory never loads pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod fill;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{list_documents, read_page, ConvertedDocument};
pub use config::{ConversionConfig, ConversionConfigBuilder, StaleOutputPolicy};
pub use convert::{convert, convert_dir, convert_dir_blocking, convert_dir_with, convert_file};
pub use error::{FileError, FileErrorKind, Pdf2HtmlError};
pub use fill::{fill_fields, parse_field, FieldLabels};
pub use output::{BatchReport, BatchStats, FileReport};
pub use pipeline::discover::ConversionJob;
pub use pipeline::render::{PageSource, PdfRenderer, PdfiumRenderer, RenderedPage};
pub use progress::{
    ConsoleReporter, ConversionProgressCallback, NoopProgressCallback, ProgressCallback,
};
