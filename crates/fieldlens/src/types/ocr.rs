//! Types describing raw OCR output, prior to any template-driven scoring.

use serde::{Deserialize, Serialize};

use super::geometry::BBox;

/// A single recognized text box, as returned by an [`crate::ocr::OcrEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrBox {
    pub text: String,
    pub confidence: f64,
    pub polygon: [(f64, f64); 4],
}

impl OcrBox {
    pub fn new(text: impl Into<String>, confidence: f64, polygon: [(f64, f64); 4]) -> Self {
        Self {
            text: text.into(),
            confidence,
            polygon,
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::from_polygon(&self.polygon)
    }
}

/// The full set of boxes an OCR pass over one image produced. Cached once
/// per [`crate::orchestrator::Orchestrator::process`] call so every field
/// searches against the same recognition pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    pub boxes: Vec<OcrBox>,
}

impl OcrResult {
    pub fn new(boxes: Vec<OcrBox>) -> Self {
        Self { boxes }
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_box_round_trips_through_json() {
        let b = OcrBox::new("INV-001", 0.92, [(0.0, 0.0), (40.0, 0.0), (40.0, 20.0), (0.0, 20.0)]);
        let json = serde_json::to_string(&b).unwrap();
        let back: OcrBox = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }

    #[test]
    fn ocr_result_empty_reports_empty() {
        assert!(OcrResult::default().is_empty());
    }
}
