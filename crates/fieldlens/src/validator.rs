//! Pure, single-pass, fail-fast template validation.
//!
//! Walks a raw `serde_json::Value` against the rules and produces a typed
//! [`Template`] on success. Fails on the first offence and reports the JSON
//! path of the bad value, mirroring how the template tooling this crate's
//! schema was distilled from reports errors.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

use crate::error::{FieldlensError, JsonPath, Result};
use crate::types::template::{
    BinarizeMethod, DenoiseMethod, FieldSpec, FieldValidation, Preprocess, ProcessingStrategy,
    RectRatio, ReferenceSize, SamplingMetadata, SamplingSizeRange, SizeRange, Template,
    DEFAULT_POSITION_WEIGHT, DEFAULT_TOLERANCE_RATIO,
};

const TEMPLATE_ID_RE: &str = r"^[a-z0-9_]+$";
const VERSION_RE: &str = r"^\d+\.\d+(\.\d+)?$";
const DATE_RE: &str = r"^\d{4}-\d{2}-\d{2}$";

/// Validate a raw template value, producing a typed [`Template`] or the
/// first [`FieldlensError::Validation`] encountered.
pub fn validate(raw: &Value) -> Result<Template> {
    let root = JsonPath::root();
    let obj = require_object(raw, &root)?;

    let template_id = require_string_matching(obj, "template_id", &root, TEMPLATE_ID_RE)?;
    let template_name = require_string_len(obj, "template_name", &root, 1, 100)?;
    let version = require_string_matching(obj, "version", &root, VERSION_RE)?;
    let processing_strategy = require_processing_strategy(obj, &root)?;
    let sampling_metadata = require_sampling_metadata(obj, &root)?;
    let preprocess = optional_preprocess(obj, &root)?;
    let regions = require_regions(obj, &root)?;

    Ok(Template {
        template_id,
        template_name,
        version,
        processing_strategy,
        sampling_metadata,
        preprocess,
        regions,
    })
}

fn require_object<'a>(value: &'a Value, path: &JsonPath) -> Result<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| FieldlensError::validation(path.to_string(), "expected a JSON object"))
}

fn field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str, path: &JsonPath) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| FieldlensError::validation(path.child(key).to_string(), "required field is missing"))
}

fn require_string_matching(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    path: &JsonPath,
    pattern: &str,
) -> Result<String> {
    let child = path.child(key);
    let s = field(obj, key, path)?
        .as_str()
        .ok_or_else(|| FieldlensError::validation(child.to_string(), "expected a string"))?;
    let re = Regex::new(pattern).expect("internal validator pattern is well-formed");
    if !re.is_match(s) {
        return Err(FieldlensError::validation(
            child.to_string(),
            format!("'{s}' does not match required pattern {pattern}"),
        ));
    }
    Ok(s.to_string())
}

fn require_string_len(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    path: &JsonPath,
    min: usize,
    max: usize,
) -> Result<String> {
    let child = path.child(key);
    let s = field(obj, key, path)?
        .as_str()
        .ok_or_else(|| FieldlensError::validation(child.to_string(), "expected a string"))?;
    if s.chars().count() < min || s.chars().count() > max {
        return Err(FieldlensError::validation(
            child.to_string(),
            format!("length must be between {min} and {max} characters"),
        ));
    }
    Ok(s.to_string())
}

fn require_processing_strategy(
    obj: &serde_json::Map<String, Value>,
    path: &JsonPath,
) -> Result<ProcessingStrategy> {
    let child = path.child("processing_strategy");
    let s = field(obj, "processing_strategy", path)?
        .as_str()
        .ok_or_else(|| FieldlensError::validation(child.to_string(), "expected a string"))?;
    match s {
        "hybrid_ocr_roi" => Ok(ProcessingStrategy::HybridOcrRoi),
        "fixed_roi" => Ok(ProcessingStrategy::FixedRoi),
        "full_ocr_only" => Ok(ProcessingStrategy::FullOcrOnly),
        "anchor_based" => Ok(ProcessingStrategy::AnchorBased),
        other => Err(FieldlensError::validation(
            child.to_string(),
            format!(
                "'{other}' is not one of hybrid_ocr_roi, fixed_roi, full_ocr_only, anchor_based"
            ),
        )),
    }
}

fn require_u32_at_least(value: &Value, path: &JsonPath, min: u32) -> Result<u32> {
    let n = value
        .as_u64()
        .ok_or_else(|| FieldlensError::validation(path.to_string(), "expected a non-negative integer"))?;
    if n < min as u64 {
        return Err(FieldlensError::validation(path.to_string(), format!("must be >= {min}")));
    }
    Ok(n as u32)
}

fn require_sampling_metadata(obj: &serde_json::Map<String, Value>, path: &JsonPath) -> Result<SamplingMetadata> {
    let child = path.child("sampling_metadata");
    let sm = require_object(field(obj, "sampling_metadata", path)?, &child)?;

    let sample_count = require_u32_at_least(field(sm, "sample_count", &child)?, &child.child("sample_count"), 1)?;

    let ref_size_path = child.child("reference_size");
    let ref_size_obj = require_object(field(sm, "reference_size", &child)?, &ref_size_path)?;
    let width = require_u32_at_least(field(ref_size_obj, "width", &ref_size_path)?, &ref_size_path.child("width"), 1)?;
    let height = require_u32_at_least(field(ref_size_obj, "height", &ref_size_path)?, &ref_size_path.child("height"), 1)?;
    let unit = ref_size_obj
        .get("unit")
        .and_then(Value::as_str)
        .ok_or_else(|| FieldlensError::validation(ref_size_path.child("unit").to_string(), "expected a string"))?;
    if unit != "pixel" {
        return Err(FieldlensError::validation(
            ref_size_path.child("unit").to_string(),
            "reference_size.unit must be 'pixel'",
        ));
    }

    let size_range = match sm.get("size_range") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let sr_path = child.child("size_range");
            let sr_obj = require_object(v, &sr_path)?;
            let width = optional_size_range(sr_obj, "width", &sr_path)?;
            let height = optional_size_range(sr_obj, "height", &sr_path)?;
            Some(SamplingSizeRange { width, height })
        }
    };

    let sampling_date = match sm.get("sampling_date") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let d_path = child.child("sampling_date");
            let s = v
                .as_str()
                .ok_or_else(|| FieldlensError::validation(d_path.to_string(), "expected a string"))?;
            let re = Regex::new(DATE_RE).expect("internal validator pattern is well-formed");
            if !re.is_match(s) {
                return Err(FieldlensError::validation(d_path.to_string(), "expected YYYY-MM-DD"));
            }
            Some(s.to_string())
        }
    };

    let sampler_version = optional_string(sm, "sampler_version", &child)?;
    let notes = optional_string(sm, "notes", &child)?;

    Ok(SamplingMetadata {
        sample_count,
        reference_size: ReferenceSize { width, height, unit: unit.to_string() },
        size_range,
        sampling_date,
        sampler_version,
        notes,
    })
}

fn optional_size_range(obj: &serde_json::Map<String, Value>, key: &str, path: &JsonPath) -> Result<Option<SizeRange>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let child = path.child(key);
            let range_obj = require_object(v, &child)?;
            let min = require_u32_at_least(field(range_obj, "min", &child)?, &child.child("min"), 1)?;
            let max = require_u32_at_least(field(range_obj, "max", &child)?, &child.child("max"), 1)?;
            Ok(Some(SizeRange { min, max }))
        }
    }
}

fn optional_string(obj: &serde_json::Map<String, Value>, key: &str, path: &JsonPath) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| FieldlensError::validation(path.child(key).to_string(), "expected a string"))?;
            Ok(Some(s.to_string()))
        }
    }
}

fn optional_preprocess(obj: &serde_json::Map<String, Value>, path: &JsonPath) -> Result<Option<Preprocess>> {
    match obj.get("preprocess") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let child = path.child("preprocess");
            let pp_obj = require_object(v, &child)?;
            let denoise = match pp_obj.get("denoise") {
                None | Some(Value::Null) => None,
                Some(v) => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| FieldlensError::validation(child.child("denoise").to_string(), "expected a string"))?;
                    Some(match s {
                        "nlm" => DenoiseMethod::Nlm,
                        "bilateral" => DenoiseMethod::Bilateral,
                        "gaussian" => DenoiseMethod::Gaussian,
                        other => {
                            return Err(FieldlensError::validation(
                                child.child("denoise").to_string(),
                                format!("'{other}' is not one of nlm, bilateral, gaussian"),
                            ))
                        }
                    })
                }
            };
            let binarize = match pp_obj.get("binarize") {
                None | Some(Value::Null) => None,
                Some(v) => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| FieldlensError::validation(child.child("binarize").to_string(), "expected a string"))?;
                    Some(match s {
                        "adaptive" => BinarizeMethod::Adaptive,
                        "otsu" => BinarizeMethod::Otsu,
                        "threshold" => BinarizeMethod::Threshold,
                        other => {
                            return Err(FieldlensError::validation(
                                child.child("binarize").to_string(),
                                format!("'{other}' is not one of adaptive, otsu, threshold"),
                            ))
                        }
                    })
                }
            };
            Ok(Some(Preprocess { denoise, binarize }))
        }
    }
}

fn require_regions(obj: &serde_json::Map<String, Value>, path: &JsonPath) -> Result<BTreeMap<String, FieldSpec>> {
    let child = path.child("regions");
    let regions_obj = require_object(field(obj, "regions", path)?, &child)?;
    if regions_obj.is_empty() {
        return Err(FieldlensError::validation(child.to_string(), "regions must not be empty"));
    }

    let mut regions = BTreeMap::new();
    for (name, value) in regions_obj {
        let field_path = child.child(name.as_str());
        let spec = validate_field_spec(value, &field_path)?;
        regions.insert(name.clone(), spec);
    }
    Ok(regions)
}

fn require_ratio(value: &Value, path: &JsonPath) -> Result<f64> {
    let n = value
        .as_f64()
        .ok_or_else(|| FieldlensError::validation(path.to_string(), "expected a number"))?;
    if !(0.0..=1.0).contains(&n) {
        return Err(FieldlensError::validation(path.to_string(), "must be in [0, 1]"));
    }
    Ok(n)
}

fn require_rect_ratio(obj: &serde_json::Map<String, Value>, key: &str, path: &JsonPath) -> Result<RectRatio> {
    let child = path.child(key);
    let rect_obj = require_object(field(obj, key, path)?, &child)?;
    let x = require_ratio(field(rect_obj, "x", &child)?, &child.child("x"))?;
    let y = require_ratio(field(rect_obj, "y", &child)?, &child.child("y"))?;
    let width = require_ratio(field(rect_obj, "width", &child)?, &child.child("width"))?;
    let height = require_ratio(field(rect_obj, "height", &child)?, &child.child("height"))?;
    Ok(RectRatio { x, y, width, height })
}

fn validate_field_spec(value: &Value, path: &JsonPath) -> Result<FieldSpec> {
    let obj = require_object(value, path)?;

    let rect_ratio = require_rect_ratio(obj, "rect_ratio", path)?;

    let rect_std_dev = match obj.get("rect_std_dev") {
        None | Some(Value::Null) => None,
        Some(_) => {
            let child = path.child("rect_std_dev");
            let rect_obj = require_object(&obj["rect_std_dev"], &child)?;
            for key in ["x", "y", "width", "height"] {
                let n = field(rect_obj, key, &child)?
                    .as_f64()
                    .ok_or_else(|| FieldlensError::validation(child.child(key).to_string(), "expected a number"))?;
                if n < 0.0 {
                    return Err(FieldlensError::validation(child.child(key).to_string(), "must be non-negative"));
                }
            }
            Some(RectRatio {
                x: rect_obj["x"].as_f64().unwrap(),
                y: rect_obj["y"].as_f64().unwrap(),
                width: rect_obj["width"].as_f64().unwrap(),
                height: rect_obj["height"].as_f64().unwrap(),
            })
        }
    };

    let pattern = optional_string(obj, "pattern", path)?;
    let fallback_pattern = optional_string(obj, "fallback_pattern", path)?;
    let description = optional_string(obj, "description", path)?;

    let extract_group = match obj.get("extract_group") {
        None | Some(Value::Null) => 0,
        Some(v) => require_u32_at_least(v, &path.child("extract_group"), 0)?,
    };

    let expected_length = match obj.get("expected_length") {
        None | Some(Value::Null) => None,
        Some(v) => Some(require_u32_at_least(v, &path.child("expected_length"), 1)?),
    };

    let required = match obj.get("required") {
        None | Some(Value::Null) => false,
        Some(v) => v
            .as_bool()
            .ok_or_else(|| FieldlensError::validation(path.child("required").to_string(), "expected a boolean"))?,
    };

    let position_weight = match obj.get("position_weight") {
        None | Some(Value::Null) => DEFAULT_POSITION_WEIGHT,
        Some(v) => require_ratio(v, &path.child("position_weight"))?,
    };

    let tolerance_ratio = match obj.get("tolerance_ratio") {
        None | Some(Value::Null) => DEFAULT_TOLERANCE_RATIO,
        Some(v) => require_ratio(v, &path.child("tolerance_ratio"))?,
    };

    let validation = match obj.get("validation") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let child = path.child("validation");
            let v_obj = require_object(v, &child)?;
            let min_length = match v_obj.get("min_length") {
                None | Some(Value::Null) => None,
                Some(v) => Some(require_u32_at_least(v, &child.child("min_length"), 0)?),
            };
            let max_length = match v_obj.get("max_length") {
                None | Some(Value::Null) => None,
                Some(v) => Some(require_u32_at_least(v, &child.child("max_length"), 0)?),
            };
            let min_value = match v_obj.get("min_value") {
                None | Some(Value::Null) => None,
                Some(v) => Some(
                    v.as_f64()
                        .ok_or_else(|| FieldlensError::validation(child.child("min_value").to_string(), "expected a number"))?,
                ),
            };
            let max_value = match v_obj.get("max_value") {
                None | Some(Value::Null) => None,
                Some(v) => Some(
                    v.as_f64()
                        .ok_or_else(|| FieldlensError::validation(child.child("max_value").to_string(), "expected a number"))?,
                ),
            };
            let allowed_values = match v_obj.get("allowed_values") {
                None | Some(Value::Null) => None,
                Some(v) => {
                    let arr = v.as_array().ok_or_else(|| {
                        FieldlensError::validation(child.child("allowed_values").to_string(), "expected an array")
                    })?;
                    let mut out = Vec::with_capacity(arr.len());
                    for (i, item) in arr.iter().enumerate() {
                        let s = item.as_str().ok_or_else(|| {
                            FieldlensError::validation(
                                child.child("allowed_values").index(i).to_string(),
                                "expected a string",
                            )
                        })?;
                        out.push(s.to_string());
                    }
                    Some(out)
                }
            };
            Some(FieldValidation { min_length, max_length, min_value, max_value, allowed_values })
        }
    };

    Ok(FieldSpec {
        rect_ratio,
        rect_std_dev,
        pattern,
        fallback_pattern,
        extract_group,
        expected_length,
        required,
        position_weight,
        tolerance_ratio,
        description,
        validation,
    })
}
