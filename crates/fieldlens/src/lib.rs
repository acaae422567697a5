//! Template-driven hybrid OCR field extraction.
//!
//! One full-page OCR pass produces a bag of text boxes; a declarative
//! [`types::Template`] maps each target field to a spatial hint, a primary
//! regular expression with an optional fallback, and shape metadata. The
//! [`extractor::HybridExtractor`] ranks every OCR box against every field
//! and [`orchestrator::Orchestrator`] composes that with an
//! [`ocr::OcrEngine`] adapter into one `process(image) -> fields` call.

pub mod config;
pub mod error;
pub mod extractor;
pub mod image_io;
pub mod ocr;
pub mod orchestrator;
pub mod types;
pub mod validator;

pub use config::EngineConfig;
pub use error::{FieldlensError, Result};
pub use extractor::HybridExtractor;
pub use ocr::{Image, OcrEngine};
pub use orchestrator::{CancellationToken, ImageInput, NeverCancelled, Orchestrator, TemplateInput};
pub use types::{ExtractionResult, FieldMatch, FieldSpec, Template};
