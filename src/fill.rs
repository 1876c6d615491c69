//! Fill blank form fields in a converted page.
//!
//! Converted forms keep their blanks as runs of underscores or dots
//! (`Patient's Name ______`). [`fill_fields`] finds a field's label, then the
//! first blank within 150 characters after it, and replaces the blank with the
//! value in a highlighted `<span>`. The label text is matched against the
//! escaped HTML, so labels containing `&` are listed in both spellings.
//!
//! After filling, a print stylesheet is appended so the page prints as a bare
//! A4 sheet without the grey viewer background.

use crate::pipeline::fragment::escape_text;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::debug;

/// Inline style of an injected value.
pub const VALUE_STYLE: &str = "color: blue; text-decoration: underline; font-weight: bold; font-family: sans-serif; font-size: 1.05em;";

/// Print-only stylesheet appended by [`fill_fields`].
pub const PRINT_STYLES: &str = r#"
    <style>
      @media print {
        @page {
          margin: 0;
          size: A4 portrait;
        }
        html, body {
          margin: 0 !important;
          padding: 0 !important;
          background: white !important;
          -webkit-print-color-adjust: exact !important;
          print-color-adjust: exact !important;
        }
        body > * {
          display: none !important;
        }
        .page-container {
          display: block !important;
          margin: -0.5cm auto 0 auto !important;
          padding: 0 !important;
          box-shadow: none !important;
          border: none !important;
          transform: scale(1.0);
          transform-origin: top center;
          width: 210mm;
          min-height: 297mm;
        }
        img {
          display: block !important;
        }
        * {
          box-shadow: none !important;
          text-shadow: none !important;
          -webkit-print-color-adjust: exact !important;
        }
        .no-print { display: none !important; }
      }
    </style>
  "#;

static HOSPITAL_LABELS: Lazy<FieldLabels> = Lazy::new(|| {
    let mut labels = FieldLabels::new();
    labels
        .insert("uid", ["UID No", "UID", "Reg No", "U.I.D. No"])
        .insert("ipd", ["IPD No", "IPD", "Indoor No", "I.P.D. No"])
        .insert(
            "admissionDate",
            [
                "Date & Time Of Admission",
                "Date &amp; Time Of Admission",
                "Date & Time of Admission",
                "Admission Date",
            ],
        )
        .insert(
            "name",
            [
                "Patient's Name",
                "Patient\u{2019}s Name",
                "Name",
                "Patient Name",
                "Name of Patient",
            ],
        )
        .insert("age", ["Age/Sex", "Age", "Sex", "Age / Sex"])
        .insert(
            "consultant",
            ["Consultant", "Doctor", "Consultant Name", "Under Consultant"],
        )
        .insert(
            "diagnosis",
            ["Diagnosis", "Provisional Diagnosis", "Final Diagnosis"],
        )
        .insert("bed", ["Bed No", "Ward/Bed", "Bed"])
        .insert("location", ["Location", "Ward", "ICU/Ward/Room"])
        .insert("duration", ["Duration"]);
    labels
});

static FIELD_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_\-]*)\s*=(.*)$").unwrap());

/// Field key → label candidates, tried in order.
#[derive(Debug, Clone, Default)]
pub struct FieldLabels {
    labels: HashMap<String, Vec<String>>,
}

impl FieldLabels {
    /// An empty map: every key is its own label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels found on the admission forms this tool was first used for.
    pub fn hospital_defaults() -> Self {
        HOSPITAL_LABELS.clone()
    }

    /// Set the candidates for `key`, replacing any previous ones.
    pub fn insert<I, S>(&mut self, key: impl Into<String>, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels
            .insert(key.into(), labels.into_iter().map(Into::into).collect());
        self
    }

    /// Candidates for `key`; an unknown key is its own only candidate.
    pub fn candidates<'a>(&'a self, key: &'a str) -> Vec<&'a str> {
        match self.labels.get(key) {
            Some(labels) => labels.iter().map(String::as_str).collect(),
            None => vec![key],
        }
    }
}

/// Fill `data` into `html` and append [`PRINT_STYLES`].
///
/// For each field the first label with a match wins; every blank that follows
/// that label is filled. Values are HTML-escaped. An empty value leaves a
/// non-breaking space so the blank disappears without shifting the line.
pub fn fill_fields(html: &str, data: &[(String, String)], labels: &FieldLabels) -> String {
    let mut result = html.to_string();

    for (key, value) in data {
        let replacement = styled_value(value);
        for label in labels.candidates(key) {
            let Some(re) = blank_after(label) else {
                continue;
            };
            if !re.is_match(&result) {
                continue;
            }
            result = re
                .replace_all(&result, |caps: &Captures| format!("{}{}", &caps[1], replacement))
                .into_owned();
            debug!("Filled '{}' after label '{}'", key, label);
            break;
        }
    }

    result.push_str(PRINT_STYLES);
    result
}

/// Parse a `key=value` command-line field.
pub fn parse_field(arg: &str) -> Option<(String, String)> {
    let caps = FIELD_ARG.captures(arg)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

fn styled_value(value: &str) -> String {
    let body = if value.is_empty() {
        "&nbsp;".to_string()
    } else {
        escape_text(value)
    };
    format!(r#"<span style="{VALUE_STYLE}">{body}</span>"#)
}

/// Label, then up to 150 characters of anything, then a blank: two or more
/// underscores, or two or more dots / ellipses / middle dots.
fn blank_after(label: &str) -> Option<Regex> {
    if label.is_empty() {
        return None;
    }
    let pattern = format!(
        r"(?i)({}[\s\S]{{0,150}}?)(_{{2,}}|[.\x{{2026}}\x{{00B7}}]{{2,}})",
        regex::escape(label)
    );
    Regex::new(&pattern).ok()
}
