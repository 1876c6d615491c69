//! Pipeline stages for PDF-to-HTML conversion.
//!
//! Each submodule implements exactly one step. Only [`render`] touches pdfium;
//! everything downstream of it works on plain values and is testable without
//! the native library.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ render ──▶ fragment ──▶ shell ──▶ write
//! (glob)      (pdfium)   (HTML div)   (page doc) (page_N.html)
//! ```
//!
//! 1. [`discover`]: list matching PDFs and derive one job per file
//! 2. [`render`]: open a document through the collaborator and extract
//!    each page's size, text runs and images
//! 3. [`fragment`]: serialise a page layout into positioned HTML; images go
//!    through [`encode`] first
//! 4. [`shell`]: wrap the fragment in the fixed, styled page document
//! 5. [`write`]: create the document directory and write page files

pub mod discover;
pub mod encode;
pub mod fragment;
pub mod render;
pub mod shell;
pub mod write;
