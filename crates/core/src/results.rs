//! Recognition history records and the text helpers used to display and
//! export them.
//!
//! PDF results are stored as plain text. Image results are stored as a JSON
//! array of recognized lines with coordinates and confidence scores; when
//! that JSON cannot be parsed the raw string is shown as-is.

use serde::{Deserialize, Serialize};

/// Characters of PDF text shown in a list preview.
pub const PDF_PREVIEW_CHARS: usize = 50;

/// Recognized lines of an image result shown in a list preview.
pub const IMAGE_PREVIEW_ITEMS: usize = 2;

/// A stored recognition result from the user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub text_result: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrText {
    pub text: String,
    pub score: f64,
}

/// One recognized line of an image result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrItem {
    #[serde(default)]
    pub coordinates: Vec<Point>,
    pub ocr_text: OcrText,
}

/// Parsed body of a result, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultDetail {
    /// PDF output; no structure.
    PlainText(String),
    /// Image output with per-line confidence.
    Items(Vec<OcrItem>),
    /// Image output that was not valid item JSON.
    Unparsed(String),
}

/// Confidence bucket for a recognized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score > 0.9 {
            Self::High
        } else if score > 0.8 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Format a 0..1 score as a percentage with two decimals.
pub fn format_score(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

/// Whether a source URL points at a PDF document.
pub fn is_pdf(url: Option<&str>) -> bool {
    url.is_some_and(|u| u.to_lowercase().ends_with(".pdf"))
}

/// Name of the text file a result is exported to.
pub fn export_file_name(id: i64) -> String {
    format!("ocr_result_{id}.txt")
}

impl OcrResult {
    pub fn is_pdf(&self) -> bool {
        is_pdf(self.image_url.as_deref())
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_pdf() {
            "PDF"
        } else {
            "image"
        }
    }
}

impl ResultDetail {
    pub fn parse(result: &OcrResult) -> Self {
        let raw = result.text_result.clone().unwrap_or_default();
        if result.is_pdf() {
            return Self::PlainText(raw);
        }
        match serde_json::from_str::<Vec<OcrItem>>(&raw) {
            Ok(items) => Self::Items(items),
            Err(_) => Self::Unparsed(raw),
        }
    }

    /// Full text for copying or export: one line per recognized item.
    pub fn plain_text(&self) -> String {
        match self {
            Self::PlainText(text) | Self::Unparsed(text) => text.clone(),
            Self::Items(items) => items
                .iter()
                .map(|item| item.ocr_text.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Short single-line preview for the history table.
///
/// Returns `None` when the result has no text at all.
pub fn preview(result: &OcrResult) -> Option<String> {
    let text = result.text_result.as_deref().filter(|t| !t.is_empty())?;

    if result.is_pdf() {
        let head: String = text.chars().take(PDF_PREVIEW_CHARS).collect();
        return Some(format!("{head}..."));
    }

    match serde_json::from_str::<Vec<OcrItem>>(text) {
        Ok(items) => Some(
            items
                .iter()
                .take(IMAGE_PREVIEW_ITEMS)
                .map(|item| item.ocr_text.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Err(_) => Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const ITEMS_JSON: &str = r#"[
        {"coordinates":[{"x":1,"y":2},{"x":3,"y":4}],"ocrText":{"text":"Hello","score":0.97}},
        {"coordinates":[],"ocrText":{"text":"world","score":0.85}},
        {"coordinates":[],"ocrText":{"text":"again","score":0.42}}
    ]"#;

    fn result(url: &str, text: Option<&str>) -> OcrResult {
        OcrResult {
            id: 42,
            image_url: Some(url.to_string()),
            text_result: text.map(str::to_string),
            create_time: None,
        }
    }

    #[test]
    fn pdf_detection_is_case_insensitive() {
        assert!(is_pdf(Some("https://cdn/x/Report.PDF")));
        assert!(!is_pdf(Some("https://cdn/x/photo.png")));
        assert!(!is_pdf(None));
    }

    #[test]
    fn image_result_parses_items() {
        let detail = ResultDetail::parse(&result("a.jpg", Some(ITEMS_JSON)));
        assert_matches!(&detail, ResultDetail::Items(items) if items.len() == 3);
        assert_eq!(detail.plain_text(), "Hello\nworld\nagain");
    }

    #[test]
    fn pdf_result_is_plain_text() {
        let detail = ResultDetail::parse(&result("a.pdf", Some("page one")));
        assert_eq!(detail, ResultDetail::PlainText("page one".into()));
    }

    #[test]
    fn malformed_image_json_falls_back_to_raw() {
        let detail = ResultDetail::parse(&result("a.jpg", Some("not json")));
        assert_eq!(detail, ResultDetail::Unparsed("not json".into()));
        assert_eq!(detail.plain_text(), "not json");
    }

    #[test]
    fn preview_shapes() {
        assert_eq!(
            preview(&result("a.jpg", Some(ITEMS_JSON))).as_deref(),
            Some("Hello world")
        );

        let long = "x".repeat(80);
        let pdf_preview = preview(&result("a.pdf", Some(&long))).unwrap();
        assert_eq!(pdf_preview, format!("{}...", "x".repeat(50)));

        assert_eq!(preview(&result("a.jpg", None)), None);
        assert_eq!(preview(&result("a.jpg", Some(""))), None);
    }

    #[test]
    fn score_tiers_and_format() {
        assert_eq!(ScoreTier::from_score(0.95), ScoreTier::High);
        assert_eq!(ScoreTier::from_score(0.9), ScoreTier::Medium);
        assert_eq!(ScoreTier::from_score(0.8), ScoreTier::Low);
        assert_eq!(format_score(0.9712), "97.12%");
    }

    #[test]
    fn export_name_uses_id() {
        assert_eq!(export_file_name(7), "ocr_result_7.txt");
    }
}
