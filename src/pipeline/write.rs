//! Output: per-document directories and page files.

use crate::error::FileError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `page_<n>.html` for 1-indexed `page_num`.
pub fn page_file_name(page_num: usize) -> String {
    format!("page_{page_num}.html")
}

/// Parse the page number back out of a page file name.
pub fn parse_page_file_name(name: &str) -> Option<usize> {
    name.strip_prefix("page_")?
        .strip_suffix(".html")?
        .parse()
        .ok()
        .filter(|&n| n >= 1)
}

/// Create the document directory (and parents). Existing directories are fine.
pub fn ensure_dir(dir: &Path) -> Result<(), FileError> {
    fs::create_dir_all(dir).map_err(|e| FileError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Write one page document as UTF-8, replacing any previous file.
pub fn write_page(dir: &Path, page_num: usize, html: &str) -> Result<PathBuf, FileError> {
    let path = dir.join(page_file_name(page_num));
    fs::write(&path, html.as_bytes()).map_err(|e| FileError::Write {
        path: path.clone(),
        source: e,
    })?;
    debug!("Wrote {} ({} bytes)", path.display(), html.len());
    Ok(path)
}

/// Remove `page_<k>.html` for every k > `page_count`. Other files are left
/// alone. Returns how many files were removed.
pub fn purge_stale_pages(dir: &Path, page_count: usize) -> Result<usize, FileError> {
    let entries = fs::read_dir(dir).map_err(|e| FileError::Write {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(n) = name.to_str().and_then(parse_page_file_name) else {
            continue;
        };
        if n > page_count {
            let path = entry.path();
            fs::remove_file(&path).map_err(|e| FileError::Write {
                path: path.clone(),
                source: e,
            })?;
            removed += 1;
        }
    }

    if removed > 0 {
        info!(
            "Removed {} stale page file(s) from {}",
            removed,
            dir.display()
        );
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileErrorKind;

    #[test]
    fn page_file_names_round_trip_numbers() {
        assert_eq!(page_file_name(7), "page_7.html");
        assert_eq!(parse_page_file_name("page_12.html"), Some(12));
        assert_eq!(parse_page_file_name("page_0.html"), None);
        assert_eq!(parse_page_file_name("page_x.html"), None);
        assert_eq!(parse_page_file_name("cover.html"), None);
    }

    #[test]
    fn write_page_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), 1, "old").unwrap();
        let path = write_page(dir.path(), 1, "new").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn write_into_missing_dir_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_page(&dir.path().join("absent"), 1, "x").unwrap_err();
        assert_eq!(err.kind(), FileErrorKind::Write);
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn purge_removes_only_pages_beyond_count() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=5 {
            write_page(dir.path(), n, "x").unwrap();
        }
        fs::write(dir.path().join("notes.html"), "keep").unwrap();

        let removed = purge_stale_pages(dir.path(), 3).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("page_3.html").exists());
        assert!(!dir.path().join("page_4.html").exists());
        assert!(!dir.path().join("page_5.html").exists());
        assert!(dir.path().join("notes.html").exists());
    }
}
