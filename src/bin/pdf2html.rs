//! CLI binary for pdf2html.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2html::progress::{failure_message, no_files_message, processing_message, success_message};
use pdf2html::{
    convert_dir, fill_fields, list_documents, parse_field, BatchReport, ConversionConfig,
    ConversionProgressCallback, FieldLabels, FileError, NoopProgressCallback, ProgressCallback,
    StaleOutputPolicy,
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar counting files, with the usual
/// progress lines printed above it.
///
/// Progress lines go to `out` (stdout in the binary) while the bar is
/// suspended, so they are written even when indicatif hides the bar.
struct CliProgressCallback {
    bar: ProgressBar,
    out: Mutex<Box<dyn Write + Send>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner on stderr until discovery reports how many files there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self::with_bar(bar, Box::new(io::stdout())))
    }

    fn with_bar(bar: ProgressBar, out: Box<dyn Write + Send>) -> Self {
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input directory…");

        Self {
            bar,
            out: Mutex::new(out),
            errors: AtomicUsize::new(0),
        }
    }

    fn line(&self, text: String) {
        self.bar.suspend(|| {
            if let Ok(mut out) = self.out.lock() {
                let _ = writeln!(out, "{text}");
                let _ = out.flush();
            }
        });
    }

    fn diagnostic(&self, text: String) {
        self.bar.suspend(|| eprintln!("{text}"));
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.diagnostic(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} PDF file(s)…"))
        ));
    }

    fn on_no_files(&self, input_dir: &Path) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", cyan("⚠"), no_files_message(input_dir));
    }

    fn on_file_start(&self, name: &str, _index: usize, _total: usize) {
        self.bar.set_message(name.to_string());
        self.line(processing_message(name));
    }

    fn on_page_written(&self, name: &str, page_num: usize, total_pages: usize) {
        self.bar
            .set_message(format!("{name}  page {page_num}/{total_pages}"));
    }

    fn on_file_complete(&self, name: &str, pages: usize) {
        self.line(format!("{} {}", green("✓"), success_message(name, pages)));
        self.bar.inc(1);
    }

    fn on_file_error(&self, name: &str, error: &FileError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.line(format!("{} {}", red("✗"), red(&failure_message(name, error))));
        for cause in error.chain().iter().skip(1) {
            self.diagnostic(format!("    {}", dim(&format!("caused by: {cause}"))));
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        self.bar.finish_and_clear();
        let stats = &report.stats;
        let failed = self.errors.load(Ordering::SeqCst);

        if failed == 0 {
            eprintln!(
                "{} {} files converted, {} pages  {}",
                green("✔"),
                bold(&stats.converted_files.to_string()),
                stats.total_pages,
                dim(&format!("{}ms", stats.duration_ms)),
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)  {}",
                if failed == stats.total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&stats.converted_files.to_string()),
                stats.total_files,
                red(&failed.to_string()),
                dim(&format!("{}ms", stats.duration_ms)),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ./files/*.pdf into ./files/html/<name>/page_<n>.html
  pdf2html

  # Same layout under another base directory
  pdf2html /srv/forms

  # Explicit directories, any case of extension, drop pages left by older runs
  pdf2html --input scans --output site/pages --ignore-case --purge-stale

  # Machine-readable report; exit non-zero if any file failed
  pdf2html --json --strict > report.json

  # List what has been converted so far
  pdf2html --list

  # Fill a converted admission form and save it for printing
  pdf2html --fill files/html/admission/page_1.html \
           --field uid=A-1042 --field name="Asha Rao" --field bed=12 \
           -o filled.html

OUTPUT LAYOUT:
  <output>/<pdf base name>/page_1.html … page_N.html
  Each page is a standalone HTML document sized to the PDF page in points.

FILL FIELDS:
  uid, ipd, admissionDate, name, age, consultant, diagnosis, bed, location,
  duration. Any other key is looked up as a literal label on the page.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium (file or directory)
  PDF2HTML_*              Every flag can also be set from the environment,
                          e.g. PDF2HTML_PATTERN, PDF2HTML_PURGE_STALE
  RUST_LOG                Overrides the log filter (logs go to stderr)

SETUP:
  pdf2html needs the pdfium shared library. It is looked up at
  --pdfium-lib / PDFIUM_LIB_PATH, then in the working directory, then
  system-wide. Prebuilt copies: https://github.com/bblanchon/pdfium-binaries
"#;

/// Convert a directory of PDF files into per-page HTML documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2html",
    version,
    about = "Convert a directory of PDF files into per-page HTML documents",
    long_about = "Convert every PDF in a directory into one standalone HTML document per page. \
Text and images keep their position on the page; each document is sized to the PDF page in \
points. Failures are reported per file and never stop the batch.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Base directory: PDFs are read from BASE_DIR/files, HTML is written to BASE_DIR/files/html.
    #[arg(default_value = ".", env = "PDF2HTML_BASE_DIR")]
    base_dir: PathBuf,

    /// Read PDFs from this directory instead of BASE_DIR/files.
    #[arg(long, env = "PDF2HTML_INPUT")]
    input: Option<PathBuf>,

    /// Write the HTML tree here instead of BASE_DIR/files/html.
    #[arg(long, env = "PDF2HTML_OUTPUT")]
    output: Option<PathBuf>,

    /// Glob pattern for file names inside the input directory.
    #[arg(long, env = "PDF2HTML_PATTERN", default_value = "*.pdf")]
    pattern: String,

    /// Match the pattern case-insensitively (picks up REPORT.PDF).
    #[arg(long, env = "PDF2HTML_IGNORE_CASE")]
    ignore_case: bool,

    /// Delete page_<k>.html files beyond the current page count.
    #[arg(long, env = "PDF2HTML_PURGE_STALE")]
    purge_stale: bool,

    /// Leave images out of the generated pages.
    #[arg(long, env = "PDF2HTML_NO_IMAGES")]
    no_images: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2HTML_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library (file or directory).
    #[arg(long, env = "PDF2HTML_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "PDF2HTML_JSON")]
    json: bool,

    /// Disable the progress bar and print plain progress lines.
    #[arg(long, env = "PDF2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2HTML_QUIET")]
    quiet: bool,

    /// Exit with an error if any file failed to convert.
    #[arg(long, env = "PDF2HTML_STRICT")]
    strict: bool,

    /// List converted documents in the output directory, no conversion.
    #[arg(long, conflicts_with = "fill")]
    list: bool,

    /// Fill form fields in a converted page instead of converting.
    #[arg(long, value_name = "PAGE_HTML")]
    fill: Option<PathBuf>,

    /// Field value for --fill, as key=value. Repeatable.
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field_arg, requires = "fill")]
    fields: Vec<(String, String)>,

    /// Where --fill writes the filled page (default: stdout).
    #[arg(short = 'o', long = "fill-output", value_name = "OUT", requires = "fill")]
    fill_output: Option<PathBuf>,
}

fn parse_field_arg(s: &str) -> std::result::Result<(String, String), String> {
    parse_field(s).ok_or_else(|| format!("expected key=value, got '{s}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let mode = ProgressMode::select(&cli, io::stderr().is_terminal());
    let show_progress = mode == ProgressMode::Bar;
    let filter = if cli.verbose {
        "debug"
    } else if mode != ProgressMode::Plain {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Fill mode ────────────────────────────────────────────────────────
    if let Some(ref page) = cli.fill {
        return run_fill(&cli, page).await;
    }

    // ── List mode ────────────────────────────────────────────────────────
    if cli.list {
        let config = build_config(&cli, mode.callback())?;
        return run_list(&cli, &config.output_dir);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli, mode.callback())?;

    // ── Run conversion ───────────────────────────────────────────────────
    let report = convert_dir(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress && report.stats.total_files > 0 {
        // Only print inline stats when the progress callback is disabled.
        eprintln!(
            "Converted {}/{} files ({} pages) in {}ms",
            report.stats.converted_files,
            report.stats.total_files,
            report.stats.total_pages,
            report.stats.duration_ms
        );
    }

    if cli.strict {
        report
            .into_result()
            .context("Strict mode: some files failed to convert")?;
    }

    Ok(())
}

/// How conversion progress reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressMode {
    /// indicatif bar on stderr, progress lines on stdout.
    Bar,
    /// The library's console reporter.
    Plain,
    Silent,
}

impl ProgressMode {
    /// A hidden bar would swallow its output, so the bar needs a terminal.
    fn select(cli: &Cli, stderr_is_terminal: bool) -> Self {
        if cli.quiet || cli.json || cli.list || cli.fill.is_some() {
            ProgressMode::Silent
        } else if cli.no_progress || !stderr_is_terminal {
            ProgressMode::Plain
        } else {
            ProgressMode::Bar
        }
    }

    /// Built only once a conversion is about to run: the bar starts ticking
    /// as soon as it exists.
    fn callback(self) -> Option<ProgressCallback> {
        match self {
            ProgressMode::Bar => {
                Some(CliProgressCallback::new_dynamic() as Arc<dyn ConversionProgressCallback>)
            }
            ProgressMode::Plain => None,
            ProgressMode::Silent => Some(Arc::new(NoopProgressCallback)),
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .base_dir(&cli.base_dir)
        .pattern(cli.pattern.clone())
        .case_sensitive(!cli.ignore_case)
        .stale_outputs(if cli.purge_stale {
            StaleOutputPolicy::Purge
        } else {
            StaleOutputPolicy::Keep
        })
        .embed_images(!cli.no_images);

    if let Some(ref dir) = cli.input {
        builder = builder.input_dir(dir.clone());
    }
    if let Some(ref dir) = cli.output {
        builder = builder.output_dir(dir.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn run_list(cli: &Cli, output_root: &Path) -> Result<()> {
    let documents = list_documents(output_root)
        .with_context(|| format!("Failed to list {}", output_root.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&documents).context("Failed to serialise catalog")?
        );
        return Ok(());
    }

    if documents.is_empty() {
        if !cli.quiet {
            eprintln!("No converted documents in {}", output_root.display());
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for doc in &documents {
        writeln!(out, "{:<40} {:>4} pages", doc.name, doc.pages.len())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}

async fn run_fill(cli: &Cli, page: &Path) -> Result<()> {
    let html = tokio::fs::read_to_string(page)
        .await
        .with_context(|| format!("Failed to read page {}", page.display()))?;

    let filled = fill_fields(&html, &cli.fields, &FieldLabels::hospital_defaults());

    match cli.fill_output {
        Some(ref out) => {
            tokio::fs::write(out, filled.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{} {} field(s) → {}",
                    green("✔"),
                    cli.fields.len(),
                    bold(&out.display().to_string())
                );
            }
        }
        None => {
            io::stdout()
                .lock()
                .write_all(filled.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn progress_lines_are_written_when_the_bar_is_hidden() {
        let out = Capture::default();
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden(), Box::new(out.clone()));

        cb.on_batch_start(2);
        cb.on_file_start("intake.pdf", 1, 2);
        cb.on_page_written("intake.pdf", 1, 1);
        cb.on_file_complete("intake.pdf", 1);
        cb.on_file_start("broken.pdf", 2, 2);
        cb.on_file_error(
            "broken.pdf",
            &FileError::Open {
                path: PathBuf::from("files/broken.pdf"),
                detail: "FormatError".into(),
            },
        );

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4, "{text}");
        assert_eq!(lines[0], processing_message("intake.pdf"));
        assert!(lines[1].contains(&success_message("intake.pdf", 1)));
        assert_eq!(lines[2], processing_message("broken.pdf"));
        assert!(lines[3].contains("broken.pdf"));
        assert_eq!(cb.errors.load(Ordering::SeqCst), 1);
        assert_eq!(cb.bar.position(), 2);
    }

    fn mode(args: &[&str], terminal: bool) -> ProgressMode {
        let argv = std::iter::once("pdf2html").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        ProgressMode::select(&cli, terminal)
    }

    #[test]
    fn bar_needs_a_terminal_and_a_conversion() {
        assert_eq!(mode(&[], true), ProgressMode::Bar);
        assert_eq!(mode(&[], false), ProgressMode::Plain);
        assert_eq!(mode(&["--no-progress"], true), ProgressMode::Plain);
        assert_eq!(mode(&["--list"], true), ProgressMode::Silent);
        assert_eq!(mode(&["--fill", "page_1.html"], true), ProgressMode::Silent);
        assert_eq!(mode(&["--json"], true), ProgressMode::Silent);
        assert_eq!(mode(&["--quiet"], false), ProgressMode::Silent);

        assert!(ProgressMode::Plain.callback().is_none());
        assert!(ProgressMode::Silent.callback().is_some());
    }

    #[test]
    fn list_and_fill_flags_parse_without_conversion_flags() {
        let cli = Cli::try_parse_from(["pdf2html", "--list", "/srv/forms"]).unwrap();
        assert!(cli.list);
        assert_eq!(cli.base_dir, PathBuf::from("/srv/forms"));

        let cli = Cli::try_parse_from([
            "pdf2html",
            "--fill",
            "page_1.html",
            "--field",
            "uid=A-1",
            "-o",
            "out.html",
        ])
        .unwrap();
        assert_eq!(cli.fields, vec![("uid".to_string(), "A-1".to_string())]);
        assert!(Cli::try_parse_from(["pdf2html", "--list", "--fill", "p.html"]).is_err());
    }
}
