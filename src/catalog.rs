//! Browse a converted tree.
//!
//! A converted document is any directory directly under the output root that
//! contains at least one `page_<n>.html` file. The catalog is read-only and
//! makes no assumption that the tree was produced by the current process.

use crate::error::Pdf2HtmlError;
use crate::pipeline::write::{page_file_name, parse_page_file_name};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One converted document in the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Directory name, i.e. the base name of the source PDF.
    pub name: String,
    pub dir: PathBuf,
    /// Page numbers present on disk, ascending.
    pub pages: Vec<usize>,
}

impl ConvertedDocument {
    /// Path of page `page_num` inside this document.
    pub fn page_path(&self, page_num: usize) -> PathBuf {
        self.dir.join(page_file_name(page_num))
    }
}

/// List every converted document under `output_root`, sorted by name.
///
/// A missing output root is an empty catalog.
pub fn list_documents(output_root: &Path) -> Result<Vec<ConvertedDocument>, Pdf2HtmlError> {
    let entries = match fs::read_dir(output_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_failed(output_root, e)),
    };

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| read_failed(output_root, e))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let pages = page_numbers(&dir)?;
        if pages.is_empty() {
            continue;
        }
        documents.push(ConvertedDocument {
            name: entry.file_name().to_string_lossy().into_owned(),
            dir,
            pages,
        });
    }

    documents.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(documents)
}

/// Read page `page_num` of document `name`.
///
/// `name` must be a single path component.
pub fn read_page(output_root: &Path, name: &str, page_num: usize) -> Result<String, Pdf2HtmlError> {
    validate_name(name)?;
    if page_num == 0 {
        return Err(Pdf2HtmlError::InvalidInput {
            input: page_num.to_string(),
            reason: "page numbers start at 1".into(),
        });
    }

    let path = output_root.join(name).join(page_file_name(page_num));
    match fs::read_to_string(&path) {
        Ok(html) => Ok(html),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Pdf2HtmlError::DocumentNotFound { path })
        }
        Err(e) => Err(read_failed(&path, e)),
    }
}

fn page_numbers(dir: &Path) -> Result<Vec<usize>, Pdf2HtmlError> {
    let mut pages: Vec<usize> = fs::read_dir(dir)
        .map_err(|e| read_failed(dir, e))?
        .flatten()
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().and_then(parse_page_file_name))
        .collect();
    pages.sort_unstable();
    Ok(pages)
}

fn validate_name(name: &str) -> Result<(), Pdf2HtmlError> {
    let reason = if name.is_empty() {
        Some("document name is empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("document name must not contain path separators")
    } else if name == "." || name.contains("..") {
        Some("document name must not contain '..'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Pdf2HtmlError::InvalidInput {
            input: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn read_failed(path: &Path, source: io::Error) -> Pdf2HtmlError {
    Pdf2HtmlError::ReadFailed {
        path: path.to_path_buf(),
        source,
    }
}
