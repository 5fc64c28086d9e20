//! Analysis result records.

use serde::{Deserialize, Serialize};

/// Result of analysing one text.
///
/// This is the fixed schema agreed with the inference provider. The
/// coordinator stores and returns records verbatim; it never interprets
/// their contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Sentiment score in `[-1.0, 1.0]`.
    pub sentiment: f32,
    /// Primary emotion label (e.g. "joy", "fear", "neutral").
    pub emotion: String,
    /// Named entities found in the text.
    pub entities: Vec<String>,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f32,
}

impl AnalysisRecord {
    /// The fixed fallback substituted when inference fails.
    ///
    /// Never written to the cache — a failed inference must not poison
    /// future lookups.
    pub fn neutral() -> Self {
        Self {
            sentiment: 0.0,
            emotion: "neutral".to_string(),
            entities: Vec::new(),
            confidence: 0.0,
        }
    }
}
