//! Ratio/pixel ROI conversion and the containment/distance math the scorer
//! builds on.

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Expand symmetrically by `tolerance_ratio` of this rect's own width/height.
    /// Only `x`/`y` are floor-clamped to the image origin; `width`/`height` are
    /// never clamped to the image's far edge, matching `P⁺(t)` as specified.
    pub fn expand(&self, tolerance_ratio: f64) -> Rect {
        let expand_w = (self.width as f64 * tolerance_ratio) as i64;
        let expand_h = (self.height as f64 * tolerance_ratio) as i64;
        let x = (self.x - expand_w).max(0);
        let y = (self.y - expand_h).max(0);
        let width = self.width + 2 * expand_w;
        let height = self.height + 2 * expand_h;
        Rect { x, y, width, height }
    }
}

/// Axis-aligned bounding box derived from an OCR polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BBox {
    pub fn from_polygon(points: &[(f64, f64); 4]) -> Self {
        let xs = points.iter().map(|p| p.0);
        let ys = points.iter().map(|p| p.1);
        let min_x = xs.clone().fold(f64::INFINITY, f64::min);
        let max_x = xs.fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.clone().fold(f64::INFINITY, f64::min);
        let max_y = ys.fold(f64::NEG_INFINITY, f64::max);
        BBox {
            x: min_x.round() as i64,
            y: min_y.round() as i64,
            width: (max_x - min_x).round() as i64,
            height: (max_y - min_y).round() as i64,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Convert a ratio rect (values in `[0.0, 1.0]` relative to image size) into pixels.
pub fn ratio_to_pixel(rect_ratio: [f64; 4], image_width: u32, image_height: u32) -> Rect {
    let [x, y, w, h] = rect_ratio;
    let image_width = image_width as f64;
    let image_height = image_height as f64;
    Rect {
        x: (x * image_width).round() as i64,
        y: (y * image_height).round() as i64,
        width: (w * image_width).round() as i64,
        height: (h * image_height).round() as i64,
    }
}

/// True if `bbox`'s center falls within `rect`, inclusive bounds.
pub fn center_in_rect(bbox: &BBox, rect: &Rect) -> bool {
    let (cx, cy) = bbox.center();
    cx >= rect.x as f64
        && cx <= (rect.x + rect.width) as f64
        && cy >= rect.y as f64
        && cy <= (rect.y + rect.height) as f64
}

pub fn euclidean_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

pub fn image_diagonal(width: u32, height: u32) -> f64 {
    ((width as f64).powi(2) + (height as f64).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_to_pixel_scales_by_image_size() {
        let rect = ratio_to_pixel([0.1, 0.2, 0.3, 0.4], 1000, 500);
        assert_eq!(rect, Rect { x: 100, y: 100, width: 300, height: 200 });
    }

    #[test]
    fn expand_grows_symmetrically() {
        let rect = Rect { x: 100, y: 100, width: 200, height: 100 };
        let expanded = rect.expand(0.2);
        assert_eq!(expanded.x, 60);
        assert_eq!(expanded.y, 80);
        assert_eq!(expanded.width, 280);
        assert_eq!(expanded.height, 140);
    }

    #[test]
    fn expand_only_clamps_origin_not_far_edge() {
        let rect = Rect { x: 0, y: 0, width: 50, height: 50 };
        let expanded = rect.expand(1.0);
        assert_eq!(expanded.x, 0);
        assert_eq!(expanded.y, 0);
        // width/height are never clamped to an image's far edge (P⁺(t) has
        // no upper bound), even though this rect sits at the image origin.
        assert_eq!(expanded.width, 150);
        assert_eq!(expanded.height, 150);
    }

    #[test]
    fn bbox_from_polygon_computes_axis_aligned_extent() {
        let bbox = BBox::from_polygon(&[(10.0, 10.0), (50.0, 12.0), (48.0, 30.0), (8.0, 28.0)]);
        assert_eq!(bbox.x, 8);
        assert_eq!(bbox.y, 10);
        assert_eq!(bbox.width, 42);
        assert_eq!(bbox.height, 20);
    }

    #[test]
    fn center_in_rect_is_inclusive_of_bounds() {
        let rect = Rect { x: 0, y: 0, width: 100, height: 100 };
        let bbox = BBox { x: 90, y: 90, width: 20, height: 20 };
        assert!(center_in_rect(&bbox, &rect));
    }

    #[test]
    fn center_in_rect_rejects_outside_center() {
        let rect = Rect { x: 0, y: 0, width: 100, height: 100 };
        let bbox = BBox { x: 200, y: 200, width: 20, height: 20 };
        assert!(!center_in_rect(&bbox, &rect));
    }
}
