//! Orchestrator (C5): owns one bound OCR adapter and at most one loaded
//! template, composing them with the hybrid extractor into a single
//! `process(image) -> ExtractionResult` call.

use std::path::Path;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{FieldlensError, Result};
use crate::extractor::HybridExtractor;
use crate::ocr::{Image, OcrEngine};
use crate::types::{ExtractionResult, Template};
use crate::validator;

/// Cooperative cancellation signal checked at well-defined points: before
/// invoking OCR, and before the scoring loop. The core never spawns
/// threads itself; implementers drive this from whatever concurrency
/// model they already have.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// A token that never cancels, used when the caller has no cancellation
/// policy of its own.
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Either a pre-decoded raster or a filesystem path to one. Mirrors the
/// flexibility of `process(image_input)` accepting a path, a `Path`, or an
/// already-decoded array.
pub enum ImageInput<'a> {
    Decoded(Image),
    Path(&'a Path),
}

/// Source for [`Orchestrator::load_template`]: either an already-parsed JSON
/// value or a filesystem path to read and parse.
pub enum TemplateInput<'a> {
    Parsed(Value),
    Path(&'a Path),
}

/// Owns one bound OCR engine and at most one loaded template. Not `Clone`:
/// orchestrators are meant to be instantiated per caller/thread and never
/// share mutable state, per the single-threaded-cooperative concurrency
/// model this crate follows.
pub struct Orchestrator {
    ocr_engine: Box<dyn OcrEngine>,
    extractor: HybridExtractor,
    config: EngineConfig,
    template: Option<Template>,
}

impl Orchestrator {
    pub fn new(ocr_engine: Box<dyn OcrEngine>, config: EngineConfig) -> Self {
        Self {
            ocr_engine,
            extractor: HybridExtractor::new(),
            config,
            template: None,
        }
    }

    /// Load a template from a parsed value or a JSON file path. Replaces
    /// any previously loaded template; leaves no residue of the old one.
    #[tracing::instrument(skip(self, input))]
    pub fn load_template(&mut self, input: TemplateInput<'_>) -> Result<()> {
        let raw = match input {
            TemplateInput::Parsed(value) => value,
            TemplateInput::Path(path) => {
                let contents = std::fs::read_to_string(path)?;
                serde_json::from_str(&contents)?
            }
        };
        let template = validator::validate(&raw)?;
        tracing::debug!(template_id = %template.template_id, regions = template.regions.len(), "template loaded");
        self.template = Some(template);
        Ok(())
    }

    /// Run the hybrid extractor over `image` using the currently loaded
    /// template. Invokes the OCR engine exactly once; its result lives only
    /// for the duration of this call and is discarded on every exit path,
    /// including errors.
    #[tracing::instrument(skip(self, image, cancellation))]
    pub fn process(&mut self, image: ImageInput<'_>, cancellation: &dyn CancellationToken) -> Result<ExtractionResult> {
        let template = self.template.as_ref().ok_or(FieldlensError::TemplateNotLoaded)?;

        let decoded = match image {
            ImageInput::Decoded(image) => image,
            ImageInput::Path(path) => {
                if !path.exists() {
                    return Err(FieldlensError::ImageNotFound(path.display().to_string()));
                }
                crate::image_io::load(path)?
            }
        };

        if cancellation.is_cancelled() {
            return Err(FieldlensError::Cancelled);
        }

        let ocr_result = self.ocr_engine.recognize(&decoded)?;

        if cancellation.is_cancelled() {
            return Err(FieldlensError::Cancelled);
        }

        let result = if self.config.parallel_scoring {
            self.extract_parallel(template, &ocr_result, decoded.width, decoded.height)
        } else {
            self.extractor.extract_fields(template, &ocr_result, decoded.width, decoded.height)
        };

        // The OCR cache is per-call only; nothing survives past this point.
        drop(ocr_result);

        Ok(result)
    }

    #[cfg(feature = "parallel")]
    fn extract_parallel(
        &self,
        template: &Template,
        ocr_result: &crate::types::OcrResult,
        image_width: u32,
        image_height: u32,
    ) -> ExtractionResult {
        use rayon::prelude::*;
        use std::collections::BTreeMap;

        let fields: BTreeMap<_, _> = template
            .regions
            .par_iter()
            .map(|(name, spec)| {
                let single = single_field_template(template, name, spec);
                let sub_result = self.extractor.extract_fields(&single, ocr_result, image_width, image_height);
                (name.clone(), sub_result.fields.into_values().next().flatten())
            })
            .collect();
        ExtractionResult { template_id: template.template_id.clone(), fields }
    }

    #[cfg(not(feature = "parallel"))]
    fn extract_parallel(
        &self,
        template: &Template,
        ocr_result: &crate::types::OcrResult,
        image_width: u32,
        image_height: u32,
    ) -> ExtractionResult {
        self.extractor.extract_fields(template, ocr_result, image_width, image_height)
    }

    /// Clear the loaded template and any residual cache state.
    pub fn reset(&mut self) {
        self.template = None;
    }

    pub fn set_language(&mut self, lang: &str) {
        self.ocr_engine.set_language(lang);
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }
}

#[cfg(feature = "parallel")]
fn single_field_template(template: &Template, name: &str, spec: &crate::types::template::FieldSpec) -> Template {
    let mut regions = std::collections::BTreeMap::new();
    regions.insert(name.to_string(), spec.clone());
    Template {
        template_id: template.template_id.clone(),
        template_name: template.template_name.clone(),
        version: template.version.clone(),
        processing_strategy: template.processing_strategy,
        sampling_metadata: template.sampling_metadata.clone(),
        preprocess: template.preprocess,
        regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::MockOcrEngine;
    use crate::types::OcrBox;
    use serde_json::json;

    fn sample_template_json() -> Value {
        json!({
            "template_id": "taiwan_einvoice_v1",
            "template_name": "Taiwan E-Invoice",
            "version": "1.0",
            "processing_strategy": "hybrid_ocr_roi",
            "sampling_metadata": {
                "sample_count": 10,
                "reference_size": {"width": 2163, "height": 1355, "unit": "pixel"}
            },
            "regions": {
                "invoice_number": {
                    "rect_ratio": {"x": 0.046, "y": 0.058, "width": 0.462, "height": 0.037},
                    "pattern": "[A-Z]{2}-\\d{8}",
                    "expected_length": 11,
                    "required": true
                }
            }
        })
    }

    fn sample_boxes() -> Vec<OcrBox> {
        vec![OcrBox::new(
            "VJ-50215372",
            0.985,
            [(100.0, 79.0), (1099.0, 79.0), (1099.0, 129.0), (100.0, 129.0)],
        )]
    }

    #[test]
    fn process_without_loaded_template_errors() {
        let engine = Box::new(MockOcrEngine::new(sample_boxes()));
        let mut orchestrator = Orchestrator::new(engine, EngineConfig::default());
        let image = Image::new(2163, 1355, vec![]);
        let err = orchestrator.process(ImageInput::Decoded(image), &NeverCancelled).unwrap_err();
        assert!(matches!(err, FieldlensError::TemplateNotLoaded));
    }

    #[test]
    fn process_invokes_ocr_exactly_once_per_call() {
        let engine = Box::new(MockOcrEngine::new(sample_boxes()));
        let mut orchestrator = Orchestrator::new(engine, EngineConfig::default());
        orchestrator.load_template(TemplateInput::Parsed(sample_template_json())).unwrap();

        let image = Image::new(2163, 1355, vec![]);
        let result = orchestrator.process(ImageInput::Decoded(image), &NeverCancelled).unwrap();
        assert_eq!(result.template_id, "taiwan_einvoice_v1");
        assert!(result.fields["invoice_number"].is_some());
    }

    #[test]
    fn reset_clears_template() {
        let engine = Box::new(MockOcrEngine::new(sample_boxes()));
        let mut orchestrator = Orchestrator::new(engine, EngineConfig::default());
        orchestrator.load_template(TemplateInput::Parsed(sample_template_json())).unwrap();
        assert!(orchestrator.template().is_some());
        orchestrator.reset();
        assert!(orchestrator.template().is_none());

        let image = Image::new(2163, 1355, vec![]);
        let err = orchestrator.process(ImageInput::Decoded(image), &NeverCancelled).unwrap_err();
        assert!(matches!(err, FieldlensError::TemplateNotLoaded));
    }

    #[test]
    fn cancellation_before_ocr_aborts_without_mutating_state() {
        struct AlwaysCancelled;
        impl CancellationToken for AlwaysCancelled {
            fn is_cancelled(&self) -> bool {
                true
            }
        }

        let engine = Box::new(MockOcrEngine::new(sample_boxes()));
        let mut orchestrator = Orchestrator::new(engine, EngineConfig::default());
        orchestrator.load_template(TemplateInput::Parsed(sample_template_json())).unwrap();

        let image = Image::new(2163, 1355, vec![]);
        let err = orchestrator.process(ImageInput::Decoded(image), &AlwaysCancelled).unwrap_err();
        assert!(matches!(err, FieldlensError::Cancelled));
        assert!(orchestrator.template().is_some());
    }

    #[test]
    fn image_not_found_for_missing_path() {
        let engine = Box::new(MockOcrEngine::new(sample_boxes()));
        let mut orchestrator = Orchestrator::new(engine, EngineConfig::default());
        orchestrator.load_template(TemplateInput::Parsed(sample_template_json())).unwrap();

        let missing = Path::new("/nonexistent/path/to/image.png");
        let err = orchestrator.process(ImageInput::Path(missing), &NeverCancelled).unwrap_err();
        assert!(matches!(err, FieldlensError::ImageNotFound(_)));
    }

    #[test]
    fn process_twice_without_reset_invokes_ocr_twice() {
        // Keep a live, countable `Arc` handle alongside the `Box<dyn
        // OcrEngine>` the orchestrator owns, so the per-call cache
        // hermeticity property (spec.md §8 scenario 6) is checked through
        // `Orchestrator::process` itself, not the bare mock.
        let engine = std::sync::Arc::new(MockOcrEngine::new(sample_boxes()));
        let boxed: Box<dyn OcrEngine> = Box::new(engine.clone());
        let mut orchestrator = Orchestrator::new(boxed, EngineConfig::default());
        orchestrator.load_template(TemplateInput::Parsed(sample_template_json())).unwrap();

        assert_eq!(engine.calls(), 0);

        let image1 = Image::new(2163, 1355, vec![]);
        let r1 = orchestrator.process(ImageInput::Decoded(image1), &NeverCancelled).unwrap();
        assert_eq!(engine.calls(), 1);

        let image2 = Image::new(2163, 1355, vec![]);
        let r2 = orchestrator.process(ImageInput::Decoded(image2), &NeverCancelled).unwrap();
        assert_eq!(engine.calls(), 2);

        assert_eq!(r1.template_id, r2.template_id);
    }
}
