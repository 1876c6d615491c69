//! Batch conversion entry points.
//!
//! Every entry point runs the same loop: ensure the output root, discover the
//! PDFs, then convert each one in isolation. A failing PDF is reported and
//! recorded in the [`BatchReport`]; it never stops the batch. Only failures
//! outside the per-file loop (creating the output root, binding pdfium) are
//! returned as `Err`.
//!
//! | Function | Collaborator | Thread |
//! |----------|--------------|--------|
//! | [`convert`] / [`convert_dir`] | pdfium | tokio blocking pool |
//! | [`convert_dir_blocking`] | pdfium | caller |
//! | [`convert_dir_with`] | caller-supplied | caller |

use crate::config::{ConversionConfig, StaleOutputPolicy};
use crate::error::{FileError, Pdf2HtmlError};
use crate::output::{BatchReport, FileReport};
use crate::pipeline::discover::{self, ConversionJob};
use crate::pipeline::render::{PdfRenderer, PdfiumRenderer};
use crate::pipeline::{shell, write};
use crate::progress::{
    ConsoleReporter, ConversionProgressCallback, NoopProgressCallback, ProgressCallback,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every PDF in `input_dir` into `output_dir/<name>/page_<n>.html`
/// with the default configuration.
///
/// Progress lines go to stdout. Per-file failures are in the returned report.
///
/// # Example
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = pdf2html::convert("files", "files/html").await?;
/// eprintln!("{} pages written", report.stats.total_pages);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<BatchReport, Pdf2HtmlError> {
    let config = ConversionConfig::builder()
        .input_dir(input_dir.as_ref())
        .output_dir(output_dir.as_ref())
        .build()?;
    convert_dir(&config).await
}

/// Run a configured batch against pdfium.
///
/// pdfium is a blocking C++ library, so the whole batch runs on tokio's
/// blocking pool rather than a runtime worker.
pub async fn convert_dir(config: &ConversionConfig) -> Result<BatchReport, Pdf2HtmlError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || convert_dir_blocking(&config))
        .await
        .map_err(|e| Pdf2HtmlError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Synchronous variant of [`convert_dir`].
///
/// pdfium is bound only when there is at least one file to convert, so an
/// empty input directory never requires the native library.
pub fn convert_dir_blocking(config: &ConversionConfig) -> Result<BatchReport, Pdf2HtmlError> {
    let start = Instant::now();
    let reporter = reporter_for(config);
    let Some(files) = prepare(config, reporter.as_ref(), start)? else {
        return Ok(empty_report(config, start));
    };
    let renderer = PdfiumRenderer::from_config(config)?;
    Ok(process(&renderer, files, config, reporter.as_ref(), start))
}

/// Run a batch with a caller-supplied collaborator.
pub fn convert_dir_with(
    renderer: &dyn PdfRenderer,
    config: &ConversionConfig,
) -> Result<BatchReport, Pdf2HtmlError> {
    let start = Instant::now();
    let reporter = reporter_for(config);
    let Some(files) = prepare(config, reporter.as_ref(), start)? else {
        return Ok(empty_report(config, start));
    };
    Ok(process(renderer, files, config, reporter.as_ref(), start))
}

/// Convert a single PDF outside a batch. Returns the page count.
///
/// Creates the job's output directory, writes every page and applies the
/// configured [`StaleOutputPolicy`]. No progress events are emitted.
pub fn convert_file(
    renderer: &dyn PdfRenderer,
    job: &ConversionJob,
    config: &ConversionConfig,
) -> Result<usize, FileError> {
    let mut report = FileReport::pending(job);
    write::ensure_dir(&job.output_dir)?;
    convert_pages(renderer, job, config, &NoopProgressCallback, &mut report)?;
    Ok(report.pages_written)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn reporter_for(config: &ConversionConfig) -> ProgressCallback {
    config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(ConsoleReporter::new()))
}

/// Create the output root and discover inputs. `None` means nothing matched;
/// the "no files" event has already been reported.
fn prepare(
    config: &ConversionConfig,
    reporter: &dyn ConversionProgressCallback,
    start: Instant,
) -> Result<Option<Vec<PathBuf>>, Pdf2HtmlError> {
    std::fs::create_dir_all(&config.output_dir).map_err(|e| Pdf2HtmlError::OutputDirFailed {
        path: config.output_dir.clone(),
        source: e,
    })?;

    let files = discover::discover_pdfs(&config.input_dir, &config.pattern, config.case_sensitive)?;
    if files.is_empty() {
        info!(
            "No files matching '{}' in {} ({}ms)",
            config.pattern,
            config.input_dir.display(),
            start.elapsed().as_millis()
        );
        reporter.on_no_files(&config.input_dir);
        return Ok(None);
    }

    info!(
        "Converting {} file(s) from {} into {}",
        files.len(),
        config.input_dir.display(),
        config.output_dir.display()
    );
    Ok(Some(files))
}

fn empty_report(config: &ConversionConfig, start: Instant) -> BatchReport {
    let mut report = BatchReport {
        input_dir: config.input_dir.clone(),
        output_dir: config.output_dir.clone(),
        ..Default::default()
    };
    report.finish(start.elapsed().as_millis() as u64);
    report
}

/// The per-file loop. Every file is attempted; failures stay inside it.
fn process(
    renderer: &dyn PdfRenderer,
    files: Vec<PathBuf>,
    config: &ConversionConfig,
    reporter: &dyn ConversionProgressCallback,
    start: Instant,
) -> BatchReport {
    let total = files.len();
    reporter.on_batch_start(total);

    let mut report = BatchReport {
        input_dir: config.input_dir.clone(),
        output_dir: config.output_dir.clone(),
        files: Vec::with_capacity(total),
        ..Default::default()
    };

    for (i, path) in files.into_iter().enumerate() {
        let job = ConversionJob::new(path, &config.output_dir);
        let file_start = Instant::now();
        let mut file_report = FileReport::pending(&job);

        let outcome = write::ensure_dir(&job.output_dir).and_then(|()| {
            reporter.on_file_start(&job.name, i + 1, total);
            convert_pages(renderer, &job, config, reporter, &mut file_report)
        });
        file_report.duration_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                info!(
                    "Converted {} → {} ({} pages, {}ms)",
                    job.name,
                    job.output_dir.display(),
                    file_report.pages_written,
                    file_report.duration_ms
                );
                reporter.on_file_complete(&job.name, file_report.pages_written);
            }
            Err(e) => {
                warn!(
                    "Failed to convert {} after {} page(s): {}",
                    job.name, file_report.pages_written, e
                );
                reporter.on_file_error(&job.name, &e);
                file_report = file_report.failed(&e);
            }
        }
        report.files.push(file_report);
    }

    report.finish(start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} files, {} pages, {}ms",
        report.stats.converted_files,
        report.stats.total_files,
        report.stats.total_pages,
        report.stats.duration_ms
    );
    reporter.on_batch_complete(&report);
    report
}

/// Open one document and write all of its pages. The document is closed when
/// this returns, on success or on the first error.
fn convert_pages(
    renderer: &dyn PdfRenderer,
    job: &ConversionJob,
    config: &ConversionConfig,
    reporter: &dyn ConversionProgressCallback,
    report: &mut FileReport,
) -> Result<(), FileError> {
    let document = renderer.open(&job.source)?;
    let page_count = document.page_count();
    report.page_count = Some(page_count);
    debug!("{}: {} pages", job.name, page_count);

    for index in 0..page_count {
        let page_num = index + 1;
        let page = document.render_page(index)?;
        let html = shell::page_document(&job.base_name, page_num, &page);
        write::write_page(&job.output_dir, page_num, &html)?;
        report.pages_written = page_num;
        reporter.on_page_written(&job.name, page_num, page_count);
    }
    drop(document);

    if config.stale_outputs == StaleOutputPolicy::Purge {
        write::purge_stale_pages(&job.output_dir, page_count)?;
    }
    Ok(())
}
