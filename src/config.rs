//! Configuration types for batch PDF-to-HTML conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Input and output roots are ordinary
//! fields rather than process-wide constants, so one process can run several
//! batches against different trees.

use crate::error::Pdf2HtmlError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Sub-directory of the base directory that holds the source PDFs.
pub const INPUT_SUBDIR: &str = "files";

/// Sub-directory of the input directory that receives the HTML tree.
pub const OUTPUT_SUBDIR: &str = "html";

/// Default discovery pattern, matched against file names directly inside the
/// input directory.
pub const DEFAULT_PATTERN: &str = "*.pdf";

/// Configuration for a batch conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2html::{ConversionConfig, StaleOutputPolicy};
///
/// let config = ConversionConfig::builder()
///     .base_dir("/srv/forms")
///     .stale_outputs(StaleOutputPolicy::Purge)
///     .build()
///     .unwrap();
/// assert!(config.output_dir.ends_with("files/html"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory scanned (non-recursively) for PDFs. Default: `files`.
    pub input_dir: PathBuf,

    /// Root of the generated tree. One sub-directory per PDF is created
    /// beneath it. Default: `files/html`.
    pub output_dir: PathBuf,

    /// Glob pattern for file names inside `input_dir`. Default: `*.pdf`.
    pub pattern: String,

    /// Whether the pattern is matched case-sensitively. Default: true.
    ///
    /// With the default, `REPORT.PDF` is not picked up by `*.pdf`.
    pub case_sensitive: bool,

    /// What to do with `page_<n>.html` files left over from an earlier run
    /// of a longer version of the same PDF. Default: [`StaleOutputPolicy::Keep`].
    pub stale_outputs: StaleOutputPolicy,

    /// Embed page images as base64 PNG data URIs in each fragment. Default: true.
    ///
    /// Disabling this produces text-only pages that are much smaller.
    pub embed_images: bool,

    /// PDF user password, tried for every file in the batch.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library. When `None`, the
    /// `PDFIUM_LIB_PATH` environment variable, the working directory and the
    /// system library are tried in that order.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Receives per-file events. When `None`, events go to a
    /// [`crate::progress::ConsoleReporter`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::for_base_dir(".")
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("pattern", &self.pattern)
            .field("case_sensitive", &self.case_sensitive)
            .field("stale_outputs", &self.stale_outputs)
            .field("embed_images", &self.embed_images)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration rooted at `base`: PDFs are read from
    /// `base/files` and HTML is written to `base/files/html`.
    pub fn for_base_dir(base: impl AsRef<Path>) -> Self {
        let input_dir = base.as_ref().join(INPUT_SUBDIR);
        let output_dir = input_dir.join(OUTPUT_SUBDIR);
        Self {
            input_dir,
            output_dir,
            pattern: DEFAULT_PATTERN.to_string(),
            case_sensitive: true,
            stale_outputs: StaleOutputPolicy::default(),
            embed_images: true,
            password: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Set both roots from a base directory (see [`ConversionConfig::for_base_dir`]).
    pub fn base_dir(mut self, base: impl AsRef<Path>) -> Self {
        let fresh = ConversionConfig::for_base_dir(base);
        self.config.input_dir = fresh.input_dir;
        self.config.output_dir = fresh.output_dir;
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn case_sensitive(mut self, v: bool) -> Self {
        self.config.case_sensitive = v;
        self
    }

    pub fn stale_outputs(mut self, policy: StaleOutputPolicy) -> Self {
        self.config.stale_outputs = policy;
        self
    }

    pub fn embed_images(mut self, v: bool) -> Self {
        self.config.embed_images = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2HtmlError> {
        let c = &self.config;
        if c.pattern.trim().is_empty() {
            return Err(Pdf2HtmlError::InvalidConfig(
                "File pattern must not be empty".into(),
            ));
        }
        if c.pattern.contains('/') || c.pattern.contains('\\') {
            return Err(Pdf2HtmlError::InvalidConfig(format!(
                "File pattern must match names inside the input directory, got '{}'",
                c.pattern
            )));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(Pdf2HtmlError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if let Err(e) = glob::Pattern::new(&c.pattern) {
            return Err(Pdf2HtmlError::InvalidPattern {
                pattern: c.pattern.clone(),
                detail: e.to_string(),
            });
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of page files from a previous run that the current run does not
/// overwrite (a PDF that shrank from 5 pages to 3 leaves `page_4.html` and
/// `page_5.html` behind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StaleOutputPolicy {
    /// Leave extra pages on disk. (default)
    #[default]
    Keep,
    /// Remove `page_<k>.html` for every k beyond the new page count after a
    /// document converts successfully.
    Purge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roots_follow_base_dir_layout() {
        let c = ConversionConfig::for_base_dir("/data/hospital");
        assert_eq!(c.input_dir, PathBuf::from("/data/hospital/files"));
        assert_eq!(c.output_dir, PathBuf::from("/data/hospital/files/html"));
        assert_eq!(c.pattern, "*.pdf");
        assert_eq!(c.stale_outputs, StaleOutputPolicy::Keep);
        assert!(c.embed_images);
    }

    #[test]
    fn builder_overrides_roots() {
        let c = ConversionConfig::builder()
            .base_dir("/a")
            .output_dir("/b/out")
            .build()
            .unwrap();
        assert_eq!(c.input_dir, PathBuf::from("/a/files"));
        assert_eq!(c.output_dir, PathBuf::from("/b/out"));
    }

    #[test]
    fn empty_pattern_rejected() {
        let err = ConversionConfig::builder().pattern("  ").build().unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::InvalidConfig(_)));
    }

    #[test]
    fn pattern_with_separator_rejected() {
        let err = ConversionConfig::builder()
            .pattern("sub/*.pdf")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_glob_rejected() {
        let err = ConversionConfig::builder()
            .pattern("[.pdf")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::InvalidPattern { .. }));
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
