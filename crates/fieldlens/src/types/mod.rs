pub mod geometry;
pub mod ocr;
pub mod result;
pub mod template;

pub use geometry::{BBox, Rect};
pub use ocr::{OcrBox, OcrResult};
pub use result::{ExtractionResult, FieldMatch, MatchCandidate};
pub use template::{FieldSpec, ProcessingStrategy, Template};
