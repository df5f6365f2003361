use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_CONFIDENCE: i32 = 30;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_MIN_WORD_COVERAGE: f64 = 0.7;

/// Thresholds for fuzzy sentence localization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocatorConfig {
    /// Tokens at or below this recognition confidence are treated as noise.
    pub min_confidence: i32,
    /// A non-numeric word matches a token when similarity is strictly above this.
    pub similarity_threshold: f64,
    /// Fraction of the sentence's words a window must match to count as a hit.
    pub min_word_coverage: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_word_coverage: DEFAULT_MIN_WORD_COVERAGE,
        }
    }
}

impl LocatorConfig {
    pub fn with_min_confidence(mut self, min_confidence: i32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_min_word_coverage(mut self, coverage: f64) -> Self {
        self.min_word_coverage = coverage;
        self
    }
}
