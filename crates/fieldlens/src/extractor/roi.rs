//! Per-layer ROI computation: converts a field's `rect_ratio` into pixels
//! and expands it according to the active fallback layer.

use crate::types::geometry::{ratio_to_pixel, Rect};
use crate::types::template::FieldSpec;

/// Which of the three fallback rounds produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// ROI expanded by the field's own `tolerance_ratio`.
    Roi,
    /// ROI expanded by `2 * tolerance_ratio`.
    RoiDoubled,
    /// No spatial filter; every OCR box is a candidate. Only reachable when
    /// `required = true`.
    WholeImage,
}

/// The base ROI in pixels for `field`, before any tolerance expansion.
pub fn base_roi(field: &FieldSpec, image_width: u32, image_height: u32) -> Rect {
    ratio_to_pixel(field.rect_ratio.to_pixel_array(), image_width, image_height)
}

/// The expanded ROI pixels for `layer`. Returns `None` for [`Layer::WholeImage`],
/// since that layer applies no spatial filter at all.
pub fn roi_for_layer(field: &FieldSpec, image_width: u32, image_height: u32, layer: Layer) -> Option<Rect> {
    let base = base_roi(field, image_width, image_height);
    match layer {
        Layer::Roi => Some(base.expand(field.tolerance_ratio)),
        Layer::RoiDoubled => Some(base.expand(field.tolerance_ratio * 2.0)),
        Layer::WholeImage => None,
    }
}
