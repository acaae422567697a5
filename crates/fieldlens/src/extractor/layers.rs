//! Per-layer candidate search: spatial filter + regex match + scoring for
//! every OCR box that survives both filters.

use regex::Regex;

use crate::types::geometry::center_in_rect;
use crate::types::template::FieldSpec;
use crate::types::{MatchCandidate, OcrBox};

use super::scoring::{bbox_center, format_score, position_score, total_score, whole_image_position_score};
use crate::types::geometry::Rect;

/// A compiled pair of primary/fallback patterns for one field, built once
/// per `extract_fields` call rather than once per layer.
pub struct CompiledPatterns {
    pub primary: Option<Regex>,
    pub fallback: Option<Regex>,
}

/// The outcome of trying to match one box's text against a field's patterns.
struct PatternMatch {
    text: String,
    used_fallback: bool,
}

fn try_match(patterns: &CompiledPatterns, text: &str, extract_group: u32) -> Option<PatternMatch> {
    if let Some(primary) = &patterns.primary {
        if let Some(captures) = primary.captures(text) {
            let extracted = extract_with_group(&captures, extract_group);
            return Some(PatternMatch { text: extracted, used_fallback: false });
        }
    } else {
        // No primary pattern: the field carries only a spatial hint, so the
        // raw OCR text is the candidate.
        return Some(PatternMatch { text: text.to_string(), used_fallback: false });
    }

    if let Some(fallback) = &patterns.fallback {
        if let Some(captures) = fallback.captures(text) {
            let extracted = extract_with_group(&captures, extract_group);
            return Some(PatternMatch { text: extracted, used_fallback: true });
        }
    }

    None
}

fn extract_with_group(captures: &regex::Captures, group: u32) -> String {
    captures
        .get(group as usize)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Search `boxes` for candidates in one layer. `roi` is `None` for the
/// whole-image layer (no spatial filter, `position_score` is always 1.0).
/// `base_roi_center` is always the center of the field's *unexpanded*
/// `rect_ratio` rect — it does not track `roi`'s own center, since the
/// expanded ROI's center can drift from the base rect's once tolerance
/// expansion clamps against the image origin.
pub fn search_layer(
    field: &FieldSpec,
    patterns: &CompiledPatterns,
    boxes: &[OcrBox],
    roi: Option<&Rect>,
    base_roi_center: (f64, f64),
    image_width: u32,
    image_height: u32,
) -> Vec<MatchCandidate> {
    let roi_center = roi.map(|_| base_roi_center);

    boxes
        .iter()
        .filter(|b| {
            let bbox = b.bbox();
            match roi {
                Some(rect) => center_in_rect(&bbox, rect),
                None => true,
            }
        })
        .filter_map(|b| {
            let matched = try_match(patterns, &b.text, field.extract_group)?;
            let bbox = b.bbox();
            let pos_score = match roi_center {
                Some(center) => position_score(bbox_center(&bbox), center, image_width, image_height),
                None => whole_image_position_score(),
            };
            let fmt_score = format_score(matched.used_fallback, matched.text.chars().count(), field.expected_length);
            let total = total_score(b.confidence, pos_score, fmt_score, field.position_weight);
            Some(MatchCandidate {
                text: matched.text,
                confidence: b.confidence,
                bbox,
                position_score: pos_score,
                format_score: fmt_score,
                total_score: total,
                used_fallback: matched.used_fallback,
            })
        })
        .collect()
}

/// Deterministic selection among a layer's candidates: sort by `total_score`
/// descending, breaking ties by confidence desc, then position_score desc,
/// then lexicographic ascending text.
pub fn select_best(mut candidates: Vec<MatchCandidate>) -> Option<(MatchCandidate, usize)> {
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| b.position_score.partial_cmp(&a.position_score).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.text.cmp(&b.text))
    });
    let count = candidates.len();
    Some((candidates.remove(0), count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::template::{RectRatio, DEFAULT_POSITION_WEIGHT, DEFAULT_TOLERANCE_RATIO};

    fn field(pattern: Option<&str>, fallback: Option<&str>, expected_length: Option<u32>) -> FieldSpec {
        FieldSpec {
            rect_ratio: RectRatio { x: 0.1, y: 0.1, width: 0.2, height: 0.1 },
            rect_std_dev: None,
            pattern: pattern.map(String::from),
            fallback_pattern: fallback.map(String::from),
            extract_group: 0,
            expected_length,
            required: false,
            position_weight: DEFAULT_POSITION_WEIGHT,
            tolerance_ratio: DEFAULT_TOLERANCE_RATIO,
            description: None,
            validation: None,
        }
    }

    fn compile(field: &FieldSpec) -> CompiledPatterns {
        CompiledPatterns {
            primary: field.pattern.as_deref().map(|p| Regex::new(p).unwrap()),
            fallback: field.fallback_pattern.as_deref().map(|p| Regex::new(p).unwrap()),
        }
    }

    #[test]
    fn primary_pattern_match_extracts_capture_group() {
        let f = {
            let mut f = field(Some(r"隨機碼[:：]\s*(\d{4})"), Some(r"\d{4}"), None);
            f.extract_group = 1;
            f
        };
        let patterns = compile(&f);
        let boxes = vec![OcrBox::new(
            "隨機碼：3472",
            0.986,
            [(1200.0, 950.0), (1700.0, 950.0), (1700.0, 1000.0), (1200.0, 1000.0)],
        )];
        let candidates = search_layer(&f, &patterns, &boxes, None, (0.0, 0.0), 2163, 1355);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "3472");
        assert!(!candidates[0].used_fallback);
    }

    #[test]
    fn fallback_pattern_is_used_and_penalized() {
        let mut f = field(Some(r"隨機碼[:：]\s*(\d{4})"), Some(r"\d{4}"), None);
        f.extract_group = 1;
        let patterns = compile(&f);
        let boxes = vec![OcrBox::new(
            "3472",
            0.98,
            [(1200.0, 950.0), (1700.0, 950.0), (1700.0, 1000.0), (1200.0, 1000.0)],
        )];
        let candidates = search_layer(&f, &patterns, &boxes, None, (0.0, 0.0), 2163, 1355);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "3472");
        assert!(candidates[0].used_fallback);
        assert_eq!(candidates[0].format_score, 0.8);
    }

    #[test]
    fn non_matching_box_is_dropped() {
        let f = field(Some(r"^\d{4}$"), None, None);
        let patterns = compile(&f);
        let boxes = vec![OcrBox::new("abcd", 0.9, [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])];
        let candidates = search_layer(&f, &patterns, &boxes, None, (0.0, 0.0), 1000, 1000);
        assert!(candidates.is_empty());
    }

    #[test]
    fn select_best_breaks_ties_by_confidence_then_position_then_text() {
        let a = MatchCandidate {
            text: "zz".to_string(),
            confidence: 0.9,
            bbox: crate::types::BBox { x: 0, y: 0, width: 1, height: 1 },
            position_score: 0.5,
            format_score: 1.0,
            total_score: 0.9,
            used_fallback: false,
        };
        let mut b = a.clone();
        b.text = "aa".to_string();
        b.confidence = 0.9;
        b.position_score = 0.5;
        let (winner, count) = select_best(vec![a, b]).unwrap();
        assert_eq!(winner.text, "aa");
        assert_eq!(count, 2);
    }

    #[test]
    fn extract_group_out_of_range_falls_back_to_whole_match() {
        let f = field(Some(r"\d{4}"), None, None);
        let mut f = f;
        f.extract_group = 5;
        let patterns = compile(&f);
        let boxes = vec![OcrBox::new("3472", 0.9, [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])];
        let candidates = search_layer(&f, &patterns, &boxes, None, (0.0, 0.0), 1000, 1000);
        assert_eq!(candidates[0].text, "3472");
    }
}
