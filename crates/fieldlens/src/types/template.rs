//! Typed, validated template model. Values here are only ever constructed by
//! [`crate::validator::validate`] — the type itself makes no attempt to
//! re-validate, it trusts the invariants the validator already enforced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default `position_weight` when a field omits it.
pub const DEFAULT_POSITION_WEIGHT: f64 = 0.3;
/// Default `tolerance_ratio` when a field omits it.
pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStrategy {
    HybridOcrRoi,
    FixedRoi,
    FullOcrOnly,
    AnchorBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenoiseMethod {
    Nlm,
    Bilateral,
    Gaussian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarizeMethod {
    Adaptive,
    Otsu,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectRatio {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectRatio {
    pub fn to_pixel_array(self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSize {
    pub width: u32,
    pub height: u32,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingMetadata {
    pub sample_count: u32,
    pub reference_size: ReferenceSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_range: Option<SamplingSizeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSizeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<SizeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<SizeRange>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Preprocess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denoise: Option<DenoiseMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binarize: Option<BinarizeMethod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub rect_ratio: RectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect_std_dev: Option<RectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_pattern: Option<String>,
    #[serde(default)]
    pub extract_group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_length: Option<u32>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_position_weight")]
    pub position_weight: f64,
    #[serde(default = "default_tolerance_ratio")]
    pub tolerance_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
}

fn default_position_weight() -> f64 {
    DEFAULT_POSITION_WEIGHT
}

fn default_tolerance_ratio() -> f64 {
    DEFAULT_TOLERANCE_RATIO
}

/// A fully validated template. Construct only via [`crate::validator::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub template_id: String,
    pub template_name: String,
    pub version: String,
    pub processing_strategy: ProcessingStrategy,
    pub sampling_metadata: SamplingMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<Preprocess>,
    pub regions: BTreeMap<String, FieldSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_field() -> FieldSpec {
        FieldSpec {
            rect_ratio: RectRatio { x: 0.1, y: 0.1, width: 0.2, height: 0.1 },
            rect_std_dev: None,
            pattern: Some(r"\d{4}".to_string()),
            fallback_pattern: None,
            extract_group: 0,
            expected_length: Some(4),
            required: true,
            position_weight: DEFAULT_POSITION_WEIGHT,
            tolerance_ratio: DEFAULT_TOLERANCE_RATIO,
            description: None,
            validation: None,
        }
    }

    #[test]
    fn template_round_trips_through_json() {
        let mut regions = BTreeMap::new();
        regions.insert("random_code".to_string(), sample_field());
        let template = Template {
            template_id: "test_template".to_string(),
            template_name: "Test".to_string(),
            version: "1.0".to_string(),
            processing_strategy: ProcessingStrategy::HybridOcrRoi,
            sampling_metadata: SamplingMetadata {
                sample_count: 10,
                reference_size: ReferenceSize { width: 2163, height: 1355, unit: "pixel".to_string() },
                size_range: None,
                sampling_date: None,
                sampler_version: None,
                notes: None,
            },
            preprocess: None,
            regions,
        };
        let json = serde_json::to_string(&template).unwrap();
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(back.template_id, "test_template");
        assert_eq!(back.regions["random_code"].expected_length, Some(4));
    }

    #[test]
    fn field_spec_defaults_position_weight_and_tolerance() {
        let json = serde_json::json!({
            "rect_ratio": {"x": 0.0, "y": 0.0, "width": 0.1, "height": 0.1}
        });
        let field: FieldSpec = serde_json::from_value(json).unwrap();
        assert_eq!(field.position_weight, DEFAULT_POSITION_WEIGHT);
        assert_eq!(field.tolerance_ratio, DEFAULT_TOLERANCE_RATIO);
        assert!(!field.required);
        assert_eq!(field.extract_group, 0);
    }
}
