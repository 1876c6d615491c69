//! Discovery: find the PDFs of a batch and derive one job per file.
//!
//! Only the top level of the input directory is scanned. A missing input
//! directory is not an error; it simply yields no files, which the batch
//! reports as "No PDF files found".

use crate::error::Pdf2HtmlError;
use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One PDF's worth of work: where it comes from and where its pages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Path of the source PDF.
    pub source: PathBuf,
    /// File name with extension, used in progress lines.
    pub name: String,
    /// File name without extension; names the output directory and titles.
    pub base_name: String,
    /// `output_root/<base_name>`.
    pub output_dir: PathBuf,
}

impl ConversionJob {
    pub fn new(source: impl Into<PathBuf>, output_root: &Path) -> Self {
        let source = source.into();
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        let output_dir = output_root.join(&base_name);
        Self {
            source,
            name,
            base_name,
            output_dir,
        }
    }
}

/// List the files directly inside `input_dir` whose names match `pattern`.
///
/// Results are in the glob crate's order (sorted by path), so repeated runs
/// over the same directory process files in the same order. Directories whose
/// names happen to match are skipped.
pub fn discover_pdfs(
    input_dir: &Path,
    pattern: &str,
    case_sensitive: bool,
) -> Result<Vec<PathBuf>, Pdf2HtmlError> {
    let full = format!(
        "{}/{}",
        Pattern::escape(&input_dir.to_string_lossy()),
        pattern
    );
    let options = MatchOptions {
        case_sensitive,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = glob_with(&full, options).map_err(|e| Pdf2HtmlError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })?;

    let mut found = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => found.push(path),
            Ok(path) => debug!("Skipping non-file match {}", path.display()),
            Err(e) => warn!("Unreadable entry in {}: {}", input_dir.display(), e),
        }
    }

    debug!(
        "Discovered {} file(s) matching '{}' in {}",
        found.len(),
        pattern,
        input_dir.display()
    );
    Ok(found)
}
