//! The OCR adapter contract. The core never depends on a specific engine;
//! it holds one `OcrEngine` trait object and calls it exactly once per
//! `process` invocation.

use crate::error::{FieldlensError, Result};
use crate::types::{OcrBox, OcrResult};

/// A raw, already-decoded raster. The core never interprets pixel data; the
/// byte payload only exists so adapters can feed it to their engine.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl Image {
    pub const MIN_DIMENSION: u32 = 100;

    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self { width, height, bytes }
    }

    pub fn meets_minimum_size(&self) -> bool {
        self.width >= Self::MIN_DIMENSION && self.height >= Self::MIN_DIMENSION
    }
}

/// Narrow capability interface to an external OCR engine. Any implementation
/// is substitutable; the extractor and orchestrator hold this as `Box<dyn
/// OcrEngine>` and never downcast.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `image`, deterministic for a given image and
    /// engine configuration. Fails with `InvalidImage` below the minimum
    /// size; returns an empty result if nothing was recognized.
    fn recognize(&self, image: &Image) -> Result<OcrResult>;

    /// Filter `result` to boxes at or above `min_confidence`, returning
    /// their text only.
    fn extract_text(&self, result: &OcrResult, min_confidence: f64) -> Vec<String> {
        result
            .boxes
            .iter()
            .filter(|b| b.confidence >= min_confidence)
            .map(|b| b.text.clone())
            .collect()
    }

    /// Filter `result` to boxes at or above `min_confidence`, keeping full box data.
    fn extract_text_with_confidence(&self, result: &OcrResult, min_confidence: f64) -> Vec<OcrBox> {
        result
            .boxes
            .iter()
            .filter(|b| b.confidence >= min_confidence)
            .cloned()
            .collect()
    }

    /// Change the recognition language for subsequent calls. Implementations
    /// typically tear down and lazily re-initialize their underlying engine.
    fn set_language(&mut self, lang: &str);
}

pub(crate) fn validate_image(image: &Image) -> Result<()> {
    if !image.meets_minimum_size() {
        return Err(FieldlensError::invalid_image(format!(
            "image size {}x{} is below the {0}x{0} minimum",
            image.width,
            image.height,
            Image::MIN_DIMENSION
        )));
    }
    Ok(())
}

/// A deterministic test double: returns a fixed set of boxes regardless of
/// the image passed in, counting invocations so cache-hermeticity tests can
/// assert `recognize` was called exactly once per `process`.
#[derive(Debug, Default)]
pub struct MockOcrEngine {
    pub boxes: Vec<OcrBox>,
    pub call_count: std::sync::atomic::AtomicUsize,
    pub language: std::sync::Mutex<String>,
}

impl MockOcrEngine {
    pub fn new(boxes: Vec<OcrBox>) -> Self {
        Self {
            boxes,
            call_count: std::sync::atomic::AtomicUsize::new(0),
            language: std::sync::Mutex::new("chinese_cht".to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, image: &Image) -> Result<OcrResult> {
        validate_image(image)?;
        self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(OcrResult::new(self.boxes.clone()))
    }

    fn set_language(&mut self, lang: &str) {
        *self.language.lock().expect("mock OCR engine mutex poisoned") = lang.to_string();
    }
}

/// Lets a test keep a live, countable handle to a [`MockOcrEngine`] while a
/// separate `Box<dyn OcrEngine>` referring to the same instance is handed to
/// [`crate::orchestrator::Orchestrator::new`]. `set_language` only needs
/// interior mutability here, since every field it touches is already behind
/// an atomic or a mutex.
impl OcrEngine for std::sync::Arc<MockOcrEngine> {
    fn recognize(&self, image: &Image) -> Result<OcrResult> {
        validate_image(image)?;
        self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(OcrResult::new(self.boxes.clone()))
    }

    fn set_language(&mut self, lang: &str) {
        *self.language.lock().expect("mock OCR engine mutex poisoned") = lang.to_string();
    }
}
