//! The rendering collaborator: open a PDF, report its page count, and turn
//! each page into a sized HTML fragment.
//!
//! The batch only sees the [`PdfRenderer`] / [`PageSource`] traits. The
//! production implementation, [`PdfiumRenderer`], wraps the pdfium C++
//! library through `pdfium-render`; tests substitute an in-memory renderer.
//!
//! ## Scoped documents
//!
//! [`PdfRenderer::open`] hands out a boxed [`PageSource`] borrowing the
//! renderer. Dropping the box closes the document, so a document can never
//! outlive the file iteration that opened it, whether the iteration finishes
//! or bails out with `?`.

use crate::config::ConversionConfig;
use crate::error::{FileError, Pdf2HtmlError};
use crate::pipeline::{encode, fragment};
use crate::pipeline::fragment::{ImageBox, PageLayout, TextRun};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an existing pdfium library (file or directory).
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// One page as delivered by the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// HTML fragment with absolutely positioned content.
    pub fragment: String,
}

/// An opened document.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Extract page `index` (0-indexed).
    fn render_page(&self, index: usize) -> Result<RenderedPage, FileError>;
}

/// Opens documents for the batch.
pub trait PdfRenderer {
    /// Open `path`. Failures (unreadable, corrupt, encrypted) are
    /// [`FileError::Open`].
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, FileError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`PdfRenderer`] backed by pdfium.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    password: Option<String>,
    embed_images: bool,
}

impl PdfiumRenderer {
    /// Bind pdfium according to `config` (see [`resolve_lib_path`]).
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2HtmlError> {
        let env = std::env::var(PDFIUM_LIB_ENV).ok();
        let lib = resolve_lib_path(config.pdfium_lib_path.as_deref(), env.as_deref());
        Ok(Self {
            pdfium: bind_pdfium(lib.as_deref())?,
            password: config.password.clone(),
            embed_images: config.embed_images,
        })
    }
}

impl PdfRenderer for PdfiumRenderer {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, FileError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| open_error(path, &format!("{:?}", e), self.password.is_some()))?;

        debug!(
            "Opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Box::new(PdfiumSource {
            document,
            embed_images: self.embed_images,
        }))
    }
}

struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
    embed_images: bool,
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize) -> Result<RenderedPage, FileError> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| FileError::Render {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let frame = page_frame(&page);
        let (width, height) = frame.display_size();

        let runs = text_runs(&page, &frame).map_err(|detail| FileError::Render {
            page: index + 1,
            detail,
        })?;
        let images = if self.embed_images {
            image_boxes(&self.document, &page, &frame, index + 1)
        } else {
            Vec::new()
        };

        debug!(
            "Page {}: {}x{}pt, {} text runs, {} images",
            index + 1,
            width,
            height,
            runs.len(),
            images.len()
        );

        let layout = PageLayout {
            index,
            width,
            height,
            runs,
            images,
        };
        Ok(RenderedPage {
            width,
            height,
            fragment: fragment::to_html(&layout),
        })
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// A rectangle in PDF user space (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl From<PdfRect> for PdfBox {
    fn from(rect: PdfRect) -> Self {
        Self {
            left: rect.left().value,
            bottom: rect.bottom().value,
            right: rect.right().value,
            top: rect.top().value,
        }
    }
}

/// The visible area of a page and how it is turned for display.
///
/// pdfium reports text and object bounds in unrotated user space, whose
/// origin is not necessarily `(0, 0)`. The frame maps those bounds to CSS
/// boxes measured from the top-left corner of the page as a viewer shows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Visible area in user space, before rotation.
    pub area: PdfBox,
    /// Clockwise display rotation in quarter turns (0..=3).
    pub quarter_turns: u8,
}

impl PageFrame {
    /// Width and height of the page as displayed, in points.
    pub fn display_size(&self) -> (f32, f32) {
        let (w, h) = self.unrotated_size();
        if self.quarter_turns % 2 == 1 {
            (h, w)
        } else {
            (w, h)
        }
    }

    fn unrotated_size(&self) -> (f32, f32) {
        (
            (self.area.right - self.area.left).abs(),
            (self.area.top - self.area.bottom).abs(),
        )
    }

    /// A user-space point as `(x, y)` from the displayed top-left corner.
    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        let (w, h) = self.unrotated_size();
        let u = x - self.area.left.min(self.area.right);
        let v = y - self.area.bottom.min(self.area.top);
        match self.quarter_turns % 4 {
            0 => (u, h - v),
            1 => (v, u),
            2 => (w - u, v),
            _ => (h - v, w - u),
        }
    }

    /// A user-space rectangle as `(left, top, width, height)` on the displayed page.
    pub fn css_box(&self, rect: PdfBox) -> (f32, f32, f32, f32) {
        let (x1, y1) = self.point(rect.left, rect.bottom);
        let (x2, y2) = self.point(rect.right, rect.top);
        (x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }
}

/// The page's bounding box (crop box clipped to media box) and rotation.
/// Falls back to the media box, then to the reported size at the origin.
fn page_frame(page: &PdfPage) -> PageFrame {
    let quarter_turns = match page.rotation() {
        Ok(PdfPageRenderRotation::Degrees90) => 1,
        Ok(PdfPageRenderRotation::Degrees180) => 2,
        Ok(PdfPageRenderRotation::Degrees270) => 3,
        _ => 0,
    };
    let area = page
        .boundaries()
        .bounding()
        .or_else(|_| page.boundaries().media())
        .map(|b| PdfBox::from(b.bounds))
        .unwrap_or_else(|e| {
            debug!("No page box, using reported size: {:?}", e);
            let (w, h) = (page.width().value, page.height().value);
            let (w, h) = if quarter_turns % 2 == 1 { (h, w) } else { (w, h) };
            PdfBox {
                left: 0.0,
                bottom: 0.0,
                right: w,
                top: h,
            }
        });
    PageFrame {
        area,
        quarter_turns,
    }
}

/// Style of a run, taken from its first visible character.
#[derive(Debug, Clone, Default, PartialEq)]
struct Glyph {
    font_size: Option<f32>,
    font_name: String,
    color: [u8; 3],
}

/// Place one text segment on the displayed page.
fn text_run(frame: &PageFrame, bounds: PdfBox, glyph: Glyph, text: String) -> TextRun {
    let (left, top, width, height) = frame.css_box(bounds);
    // Glyphs are not turned, so a rotated line is as tall as its box is wide.
    let line_height = if frame.quarter_turns % 2 == 1 { width } else { height };
    let (bold, italic) = fragment::font_style(&glyph.font_name);
    TextRun {
        left,
        top,
        line_height,
        font_size: glyph.font_size.unwrap_or(line_height),
        font_family: glyph.font_name,
        bold,
        italic,
        color: glyph.color,
        text,
    }
}

/// Place one image object on the displayed page.
fn image_box(frame: &PageFrame, bounds: PdfBox, src: String) -> ImageBox {
    let (left, top, width, height) = frame.css_box(bounds);
    ImageBox {
        left,
        top,
        width,
        height,
        src,
    }
}

/// One run per pdfium text segment.
fn text_runs(page: &PdfPage, frame: &PageFrame) -> Result<Vec<TextRun>, String> {
    let text = page.text().map_err(|e| format!("{:?}", e))?;

    let mut runs = Vec::new();
    for segment in text.segments().iter() {
        let content = segment.text();
        if content.trim().is_empty() {
            continue;
        }

        let mut glyph = Glyph::default();
        if let Ok(chars) = segment.chars() {
            let first = chars
                .iter()
                .find(|c| c.unicode_char().is_some_and(|ch| !ch.is_whitespace()));
            if let Some(first) = first {
                glyph.font_size = Some(first.scaled_font_size().value);
                glyph.font_name = first.font_name();
                if let Ok(c) = first.fill_color() {
                    glyph.color = [c.red(), c.green(), c.blue()];
                }
            }
        }

        runs.push(text_run(frame, segment.bounds().into(), glyph, content));
    }
    Ok(runs)
}

/// Image objects as positioned data URIs. Undecodable images are skipped.
fn image_boxes(
    document: &PdfDocument,
    page: &PdfPage,
    frame: &PageFrame,
    page_num: usize,
) -> Vec<ImageBox> {
    let mut boxes = Vec::new();
    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };

        let bounds = match object.bounds() {
            Ok(b) => b,
            Err(e) => {
                warn!("Page {}: image without bounds skipped: {:?}", page_num, e);
                continue;
            }
        };
        let src = match image_object
            .get_processed_image(document)
            .map_err(|e| format!("{:?}", e))
            .and_then(|img| encode::to_data_uri(&img).map_err(|e| e.to_string()))
        {
            Ok(src) => src,
            Err(e) => {
                warn!("Page {}: image could not be decoded: {}", page_num, e);
                continue;
            }
        };

        boxes.push(image_box(frame, bounds.to_rect().into(), src));
    }
    boxes
}

/// Map a pdfium load failure to an open error, calling out passwords.
fn open_error(path: &Path, detail: &str, had_password: bool) -> FileError {
    let detail = if detail.contains("Password") || detail.contains("password") {
        if had_password {
            "wrong password".to_string()
        } else {
            "document is encrypted and requires a password".to_string()
        }
    } else {
        detail.to_string()
    };
    FileError::Open {
        path: path.to_path_buf(),
        detail,
    }
}

// ── Binding ──────────────────────────────────────────────────────────────

/// Pick the library location: explicit config first, then the environment.
/// `None` means "search the working directory, then the system".
pub fn resolve_lib_path(explicit: Option<&Path>, env: Option<&str>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
}

/// Bind to pdfium. `lib` may name the library file or its directory.
pub fn bind_pdfium(lib: Option<&Path>) -> Result<Pdfium, Pdf2HtmlError> {
    let bindings = match lib {
        Some(path) if path.is_dir() => {
            let dir = path.to_string_lossy().into_owned();
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir.as_str()))
        }
        Some(path) => Pdfium::bind_to_library(path.to_string_lossy().into_owned()),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| {
        let location = lib
            .map(|p| format!(" at '{}'", p.display()))
            .unwrap_or_default();
        Pdf2HtmlError::PdfiumBindingFailed(format!("{:?}{}", e, location))
    })?;

    info!("pdfium bound");
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileErrorKind;

    fn letter(quarter_turns: u8) -> PageFrame {
        PageFrame {
            area: PdfBox {
                left: 0.0,
                bottom: 0.0,
                right: 612.0,
                top: 792.0,
            },
            quarter_turns,
        }
    }

    fn label_box() -> PdfBox {
        // "UID No:" one inch from the left, one inch below the top edge.
        PdfBox {
            left: 72.0,
            bottom: 708.0,
            right: 112.0,
            top: 720.0,
        }
    }

    #[test]
    fn upright_page_flips_y_from_the_top_edge() {
        let frame = letter(0);
        assert_eq!(frame.display_size(), (612.0, 792.0));
        assert_eq!(frame.css_box(label_box()), (72.0, 72.0, 40.0, 12.0));
    }

    #[test]
    fn page_box_origin_is_subtracted() {
        // Same page shifted by a /MediaBox [36 -18 648 774].
        let frame = PageFrame {
            area: PdfBox {
                left: 36.0,
                bottom: -18.0,
                right: 648.0,
                top: 774.0,
            },
            quarter_turns: 0,
        };
        let shifted = PdfBox {
            left: 108.0,
            bottom: 690.0,
            right: 148.0,
            top: 702.0,
        };
        assert_eq!(frame.display_size(), (612.0, 792.0));
        assert_eq!(frame.css_box(shifted), (72.0, 72.0, 40.0, 12.0));
    }

    #[test]
    fn rotated_pages_swap_size_and_turn_boxes() {
        let frame = letter(1);
        assert_eq!(frame.display_size(), (792.0, 612.0));
        assert_eq!(frame.css_box(label_box()), (708.0, 72.0, 12.0, 40.0));

        let frame = letter(2);
        assert_eq!(frame.display_size(), (612.0, 792.0));
        assert_eq!(frame.css_box(label_box()), (500.0, 708.0, 40.0, 12.0));

        let frame = letter(3);
        assert_eq!(frame.display_size(), (792.0, 612.0));
        assert_eq!(frame.css_box(label_box()), (72.0, 500.0, 12.0, 40.0));
    }

    #[test]
    fn text_run_takes_position_from_bounds_and_style_from_glyph() {
        let glyph = Glyph {
            font_size: Some(11.0),
            font_name: "ABCDEF+Arial-BoldMT".into(),
            color: [0, 0, 255],
        };
        let run = text_run(&letter(0), label_box(), glyph, "UID No:".into());
        assert_eq!((run.left, run.top, run.line_height), (72.0, 72.0, 12.0));
        assert_eq!(run.font_size, 11.0);
        assert!(run.bold && !run.italic);
        assert_eq!(run.color, [0, 0, 255]);

        // Turned page without a visible glyph: the line is as tall as the
        // displayed box is wide, and that height stands in for the font size.
        let run = text_run(&letter(1), label_box(), Glyph::default(), " x".into());
        assert_eq!((run.left, run.top), (708.0, 72.0));
        assert_eq!(run.line_height, 12.0);
        assert_eq!(run.font_size, 12.0);
    }

    #[test]
    fn image_box_uses_the_same_mapping() {
        let img = image_box(&letter(0), label_box(), "data:,".into());
        assert_eq!((img.left, img.top, img.width, img.height), (72.0, 72.0, 40.0, 12.0));
    }

    #[test]
    fn explicit_lib_path_wins_over_env() {
        let p = resolve_lib_path(Some(Path::new("/opt/pdfium")), Some("/usr/lib"));
        assert_eq!(p, Some(PathBuf::from("/opt/pdfium")));
    }

    #[test]
    fn env_lib_path_used_when_no_explicit() {
        let p = resolve_lib_path(None, Some("/usr/lib/libpdfium.so"));
        assert_eq!(p, Some(PathBuf::from("/usr/lib/libpdfium.so")));
        assert_eq!(resolve_lib_path(None, Some("  ")), None);
        assert_eq!(resolve_lib_path(None, None), None);
    }

    #[test]
    fn password_failures_are_explained() {
        let e = open_error(Path::new("a.pdf"), "PdfiumLibraryInternalError(PasswordError)", false);
        assert_eq!(e.kind(), FileErrorKind::Open);
        assert!(e.to_string().contains("requires a password"));

        let e = open_error(Path::new("a.pdf"), "PdfiumLibraryInternalError(PasswordError)", true);
        assert!(e.to_string().contains("wrong password"));
    }

    #[test]
    fn other_failures_keep_detail() {
        let e = open_error(Path::new("a.pdf"), "PdfiumLibraryInternalError(FormatError)", false);
        assert!(e.to_string().contains("FormatError"));
        assert!(e.to_string().contains("a.pdf"));
    }
}
