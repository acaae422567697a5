//! Ambient configuration passed to the orchestrator at construction,
//! analogous to the extraction-config layer threaded through the teacher's
//! CLI commands.

use serde::{Deserialize, Serialize};

/// Default `min_confidence` floor applied by `OcrEngine::extract_text` and
/// `extract_text_with_confidence` helpers when a caller does not override it.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Confidence floor used by OCR-adapter text-extraction helpers.
    pub min_confidence: f64,
    /// Whether `Orchestrator::process` scores independent fields in
    /// parallel. Has no effect unless the `parallel` feature is enabled;
    /// falls back to sequential scoring otherwise.
    pub parallel_scoring: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            parallel_scoring: false,
        }
    }
}

impl EngineConfig {
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_parallel_scoring(mut self, parallel_scoring: bool) -> Self {
        self.parallel_scoring = parallel_scoring;
        self
    }
}
