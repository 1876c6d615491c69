//! Fragment serialisation: a page's positioned text runs and images → HTML.
//!
//! The fragment is a single root `<div>` whose children are absolutely
//! positioned in points relative to the page's top-left corner. The page
//! shell's `.page-container > div` rule stretches that root over the
//! container, so the fragment's own declared size never matters.
//!
//! Coordinates arrive here already flipped (PDF space has its origin at the
//! bottom-left). This module does no PDF work at all, which keeps it testable
//! without a pdfium library.

use std::fmt::Write as _;

/// One line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Distance from the page's left edge, in points.
    pub left: f32,
    /// Distance from the page's top edge to the run's top, in points.
    pub top: f32,
    /// Height of the run's box, in points.
    pub line_height: f32,
    pub font_size: f32,
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    /// Fill colour as RGB.
    pub color: [u8; 3],
    pub text: String,
}

/// An embedded image at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// `data:` URI with the encoded image.
    pub src: String,
}

/// Everything the serializer needs for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// 0-indexed page number, used for the root element id.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub runs: Vec<TextRun>,
    pub images: Vec<ImageBox>,
}

/// Serialise a page layout into its HTML fragment.
///
/// Images come first so text paints above them. Runs that share a line
/// become sibling `<span>`s of one `<p>`, so a label and the blank printed
/// after it stay a few dozen characters apart in the markup. Lines are
/// emitted top to bottom and spans left to right.
pub fn to_html(layout: &PageLayout) -> String {
    let mut html = String::with_capacity(256 + layout.runs.len() * 160);
    let _ = writeln!(
        html,
        "<div id=\"page{}\" style=\"position:relative;width:{}pt;height:{}pt;\">",
        layout.index,
        num(layout.width),
        num(layout.height)
    );

    for img in &layout.images {
        let _ = writeln!(
            html,
            "<img style=\"position:absolute;left:{}pt;top:{}pt;width:{}pt;height:{}pt\" src=\"{}\">",
            num(img.left),
            num(img.top),
            num(img.width),
            num(img.height),
            escape_attr(&img.src)
        );
    }

    for line in lines(&layout.runs) {
        let top = line.iter().map(|r| r.top).fold(f32::INFINITY, f32::min);
        let left = line.iter().map(|r| r.left).fold(f32::INFINITY, f32::min);
        let line_height = line.iter().map(|r| r.line_height).fold(0.0, f32::max);

        let _ = write!(
            html,
            "<p style=\"position:absolute;white-space:pre;margin:0;padding:0;top:{}pt;left:{}pt;line-height:{}pt\">",
            num(top),
            num(left),
            num(line_height)
        );
        for run in line {
            let mut inner = escape_text(&run.text);
            if run.italic {
                inner = format!("<i>{inner}</i>");
            }
            if run.bold {
                inner = format!("<b>{inner}</b>");
            }
            let offset = match num(run.top - top).as_str() {
                "0" => String::new(),
                dy => format!("top:{dy}pt;"),
            };
            let _ = write!(
                html,
                "<span style=\"position:absolute;left:{}pt;{}font-family:{};font-size:{}pt;color:#{:02x}{:02x}{:02x}\">{}</span>",
                num(run.left - left),
                offset,
                escape_attr(&font_stack(&css_font_family(&run.font_family))),
                num(run.font_size),
                run.color[0],
                run.color[1],
                run.color[2],
                inner
            );
        }
        html.push_str("</p>\n");
    }

    html.push_str("</div>");
    html
}

/// Group non-empty runs into lines, each sorted left to right.
///
/// Two runs share a line when their vertical centres are closer than half
/// the smaller of their heights.
fn lines(runs: &[TextRun]) -> Vec<Vec<&TextRun>> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.is_empty()).collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then_with(|| a.left.total_cmp(&b.left)));

    let mut lines: Vec<Vec<&TextRun>> = Vec::new();
    for run in sorted {
        match lines.last_mut() {
            Some(line) if same_line(line[0], run) => line.push(run),
            _ => lines.push(vec![run]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.left.total_cmp(&b.left));
    }
    lines
}

fn same_line(a: &TextRun, b: &TextRun) -> bool {
    let centre = |r: &TextRun| r.top + r.line_height / 2.0;
    let slack = a.line_height.min(b.line_height) / 2.0;
    (centre(a) - centre(b)).abs() < slack.max(0.5)
}

/// CSS `font-family` value: the family as a quoted string, then `serif`.
///
/// PDF font names may start with a digit or contain `;` or quotes, none of
/// which survive as a bare identifier. Generic families stay unquoted.
pub fn font_stack(family: &str) -> String {
    if matches!(family, "serif" | "sans-serif" | "monospace") {
        return format!("{family},serif");
    }
    let quoted = family.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{quoted}',serif")
}

/// Strip a subset prefix (`ABCDEF+Helvetica`) and style suffixes
/// (`Helvetica-Bold`, `Arial,Italic`) to get a usable CSS family name.
pub fn css_font_family(pdf_font_name: &str) -> String {
    let name = match pdf_font_name.split_once('+') {
        Some((prefix, rest)) if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) => {
            rest
        }
        _ => pdf_font_name,
    };
    let family = name
        .split(|c| c == '-' || c == ',')
        .next()
        .unwrap_or(name)
        .trim();
    if family.is_empty() {
        "sans-serif".to_string()
    } else {
        family.to_string()
    }
}

/// Infer `(bold, italic)` from a PDF font name.
pub fn font_style(pdf_font_name: &str) -> (bool, bool) {
    let lower = pdf_font_name.to_ascii_lowercase();
    let bold = ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|w| lower.contains(w));
    let italic = lower.contains("italic") || lower.contains("oblique");
    (bold, italic)
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            // PDFium reports soft line ends inside segments as control chars.
            '\r' | '\n' => out.push(' '),
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// Escape a value placed inside a double-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Format a length in points, rounded to hundredths, never `-0`.
fn num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
