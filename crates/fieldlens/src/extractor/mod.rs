//! The hybrid extractor (C4): three-layer fallback search plus
//! multi-component scoring, producing one [`FieldMatch`] or `None` per
//! templated field.

pub mod layers;
pub mod roi;
pub mod scoring;

use std::collections::BTreeMap;

use regex::Regex;

use crate::types::template::{FieldSpec, Template};
use crate::types::{ExtractionResult, FieldMatch, OcrResult};

use layers::{search_layer, select_best, CompiledPatterns};
use roi::{base_roi, roi_for_layer, Layer};
use scoring::{effective_position_weight, rect_center};

/// Stateless scorer/searcher. Holds no OCR adapter or template state of its
/// own — both are passed in at call time, matching the orchestrator's
/// ownership of all long-lived state.
#[derive(Debug, Default)]
pub struct HybridExtractor;

impl HybridExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Score `ocr` against every region in `template`, returning one
    /// [`ExtractionResult`] keyed by field name. Fields with no acceptable
    /// candidate map to `None`.
    pub fn extract_fields(&self, template: &Template, ocr: &OcrResult, image_width: u32, image_height: u32) -> ExtractionResult {
        let mut fields = BTreeMap::new();
        for (name, spec) in &template.regions {
            let result = self.extract_field(name, spec, ocr, image_width, image_height);
            fields.insert(name.clone(), result);
        }
        ExtractionResult { template_id: template.template_id.clone(), fields }
    }

    fn extract_field(
        &self,
        name: &str,
        spec: &FieldSpec,
        ocr: &OcrResult,
        image_width: u32,
        image_height: u32,
    ) -> Option<FieldMatch> {
        let patterns = match compile_patterns(name, spec) {
            Ok(patterns) => patterns,
            Err(()) => return None,
        };

        warn_if_position_weight_clamped(name, spec.position_weight);

        // C_R is always the center of the *unexpanded* rect_ratio rectangle,
        // regardless of which tolerance layer's expanded ROI is doing the
        // spatial filtering — the expanded ROI's own center can drift from
        // it once `Rect::expand`'s x/y clamp kicks in near the image edge.
        let roi_center = rect_center(&base_roi(spec, image_width, image_height));

        for layer in [Layer::Roi, Layer::RoiDoubled] {
            let roi = roi_for_layer(spec, image_width, image_height, layer);
            let candidates = search_layer(spec, &patterns, &ocr.boxes, roi.as_ref(), roi_center, image_width, image_height);
            if let Some((winner, count)) = select_best(candidates) {
                return Some(FieldMatch::from_candidate(&winner, count));
            }
        }

        if spec.required {
            let candidates = search_layer(spec, &patterns, &ocr.boxes, None, roi_center, image_width, image_height);
            if let Some((winner, count)) = select_best(candidates) {
                return Some(FieldMatch::from_candidate(&winner, count));
            }
        }

        None
    }
}

/// `position_weight` is schema-legal in `[0.0, 1.0]` but scoring only
/// supports `[0.0, 0.5]` (see `scoring::effective_position_weight`). Warn
/// once per field the first time it is scored if clamping would change the
/// configured value.
fn warn_if_position_weight_clamped(field_name: &str, position_weight: f64) {
    let effective = effective_position_weight(position_weight);
    if effective != position_weight {
        tracing::warn!(
            field = field_name,
            configured = position_weight,
            effective,
            "position_weight outside [0.0, 0.5]; clamped for scoring"
        );
    }
}

/// Compile a field's primary/fallback regex. An invalid pattern is a soft
/// failure: the field becomes an empty candidate list rather than aborting
/// extraction for the rest of the template.
fn compile_patterns(field_name: &str, spec: &FieldSpec) -> Result<CompiledPatterns, ()> {
    let primary = match &spec.pattern {
        None => None,
        Some(p) => match Regex::new(p) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(field = field_name, pattern = %p, error = %err, "invalid primary pattern; field yields no candidates");
                return Err(());
            }
        },
    };
    let fallback = match &spec.fallback_pattern {
        None => None,
        Some(p) => match Regex::new(p) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(field = field_name, pattern = %p, error = %err, "invalid fallback pattern; ignoring it");
                None
            }
        },
    };
    Ok(CompiledPatterns { primary, fallback })
}
