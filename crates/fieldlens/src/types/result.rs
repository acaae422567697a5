//! Transient scoring results (`MatchCandidate`) and the final, serializable
//! `ExtractionResult` a `process()` call returns.

use serde::{Deserialize, Serialize};

use super::geometry::BBox;

/// One OCR box scored against one field, alive only inside the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub text: String,
    pub confidence: f64,
    pub bbox: BBox,
    pub position_score: f64,
    pub format_score: f64,
    pub total_score: f64,
    pub used_fallback: bool,
}

/// A field's winning candidate, as it appears in [`ExtractionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub text: String,
    pub confidence: f64,
    pub bbox: [i64; 4],
    pub position_score: f64,
    pub format_score: f64,
    pub total_score: f64,
    pub candidates_count: usize,
}

impl FieldMatch {
    pub fn from_candidate(candidate: &MatchCandidate, candidates_count: usize) -> Self {
        let bbox = candidate.bbox;
        FieldMatch {
            text: candidate.text.clone(),
            confidence: candidate.confidence,
            bbox: [bbox.x, bbox.y, bbox.width, bbox.height],
            position_score: candidate.position_score,
            format_score: candidate.format_score,
            total_score: candidate.total_score,
            candidates_count,
        }
    }
}

/// The result of one `Orchestrator::process` call: every templated field,
/// present or absent (`None` means no acceptable candidate was found).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub template_id: String,
    pub fields: std::collections::BTreeMap<String, Option<FieldMatch>>,
}
