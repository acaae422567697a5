//! Multi-component candidate scoring: position, format, and their weighted
//! combination into `total_score`.

use crate::types::geometry::{euclidean_distance, image_diagonal, BBox, Rect};

/// Piecewise position score from normalized center-distance `n = d / diagonal`.
/// 1.0 at the ROI center, smoothly falling to 0 by `n ≈ 0.2`, with a small
/// non-negative residual used only to break ties on far-field boxes.
pub fn position_score(bbox_center: (f64, f64), roi_center: (f64, f64), image_width: u32, image_height: u32) -> f64 {
    let d = euclidean_distance(bbox_center, roi_center);
    let diagonal = image_diagonal(image_width, image_height);
    if diagonal == 0.0 {
        return 0.0;
    }
    let n = d / diagonal;
    if n < 0.10 {
        1.0 - 5.0 * n
    } else if n < 0.20 {
        0.5 - 5.0 * (n - 0.10)
    } else {
        (0.10 - 0.5 * n).max(0.0)
    }
}

/// Position score for a whole-image (Layer 3) match: no ROI, always 1.0.
pub fn whole_image_position_score() -> f64 {
    1.0
}

/// Format score: starts at 1.0, penalized for using the fallback pattern
/// and for deviating from `expected_length`, clamped to `>= 0`.
pub fn format_score(used_fallback: bool, text_len: usize, expected_length: Option<u32>) -> f64 {
    let mut score = 1.0;
    if used_fallback {
        score -= 0.2;
    }
    if let Some(expected) = expected_length {
        let diff = (text_len as i64 - expected as i64).unsigned_abs() as f64;
        score -= (diff * 0.05).min(0.5);
    }
    score.max(0.0)
}

/// Clamp `position_weight` into `[0.0, 0.5]` so `total_score`'s complementary
/// format coefficient `(0.5 - position_weight)` never goes negative. Schema
/// validation allows `[0.0, 1.0]`; only the scoring formula clamps further.
pub fn effective_position_weight(position_weight: f64) -> f64 {
    position_weight.clamp(0.0, 0.5)
}

/// `total = 0.5*confidence + w*position_score + (0.5-w)*format_score`.
pub fn total_score(confidence: f64, position_score: f64, format_score: f64, position_weight: f64) -> f64 {
    let w = effective_position_weight(position_weight);
    0.5 * confidence + w * position_score + (0.5 - w) * format_score
}

/// Compute the axis-aligned center of a Rect, matching `BBox::center`'s shape
/// so both can feed `position_score` uniformly.
pub fn rect_center(rect: &Rect) -> (f64, f64) {
    rect.center()
}

pub fn bbox_center(bbox: &BBox) -> (f64, f64) {
    bbox.center()
}
