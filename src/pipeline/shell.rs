//! Page shell: wrap a fragment in a complete, styled HTML document.
//!
//! The stylesheet is fixed. `.page-container` is sized to the PDF page in
//! points and clips its content; its direct `div` child (the fragment's root)
//! is forced to cover it, correcting the fragment's own absolute placement.

use crate::pipeline::fragment::escape_text;
use crate::pipeline::render::RenderedPage;

/// Title of a page document: `"<base_name> - Page <page_num>"`.
pub fn page_title(base_name: &str, page_num: usize) -> String {
    format!("{base_name} - Page {page_num}")
}

/// Compose the page document for 1-indexed `page_num` of `base_name`.
pub fn page_document(base_name: &str, page_num: usize, page: &RenderedPage) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{
            margin: 0;
            padding: 20px;
            background-color: #e0e0e0;
            font-family: sans-serif;
            display: flex;
            flex-direction: column;
            align-items: center;
        }}
        .page-container {{
            width: {width}pt;
            height: {height}pt;
            background-color: white;
            position: relative;
            overflow: hidden;
            box-shadow: 0 4px 15px rgba(0,0,0,0.2);
            box-sizing: border-box;
        }}
        /* Ensure the content inside respects the container */
        .page-container > div {{
            position: absolute !important;
            top: 0;
            left: 0;
            width: 100%;
            height: 100%;
        }}
    </style>
</head>
<body>
    <div class="page-container">
        {fragment}
    </div>
</body>
</html>"#,
        title = escape_text(&page_title(base_name, page_num)),
        width = page.width,
        height = page.height,
        fragment = page.fragment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: f32, height: f32) -> RenderedPage {
        RenderedPage {
            width,
            height,
            fragment: "<div id=\"page0\"><p>hello</p></div>".into(),
        }
    }

    #[test]
    fn title_names_document_and_page() {
        let html = page_document("Consent Form", 3, &page(612.0, 792.0));
        assert!(html.contains("<title>Consent Form - Page 3</title>"));
    }

    #[test]
    fn container_sized_in_points() {
        let html = page_document("a", 1, &page(595.5, 842.25));
        assert!(html.contains("width: 595.5pt;"));
        assert!(html.contains("height: 842.25pt;"));
    }

    #[test]
    fn fragment_inside_container() {
        let html = page_document("a", 1, &page(10.0, 10.0));
        let container = html.find("<div class=\"page-container\">").unwrap();
        let fragment = html.find("<div id=\"page0\">").unwrap();
        assert!(container < fragment);
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn shell_carries_fixed_styles() {
        let html = page_document("a", 1, &page(10.0, 10.0));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert!(html.contains("content=\"width=device-width, initial-scale=1\""));
        assert!(html.contains("background-color: #e0e0e0;"));
        assert!(html.contains("overflow: hidden;"));
        assert!(html.contains("box-shadow: 0 4px 15px rgba(0,0,0,0.2);"));
        assert!(html.contains(".page-container > div {"));
        assert!(html.contains("position: absolute !important;"));
    }

    #[test]
    fn title_is_escaped() {
        let html = page_document("Tom & Jerry", 1, &page(10.0, 10.0));
        assert!(html.contains("<title>Tom &amp; Jerry - Page 1</title>"));
    }
}
