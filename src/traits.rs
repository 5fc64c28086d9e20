//! Provider trait for the inference boundary.
//!
//! The coordinator never inspects text semantics — it keys, times, counts,
//! and reorders. Everything that actually turns a text into an
//! [`AnalysisRecord`] sits behind [`AnalysisProvider`], injected at build
//! time, which keeps the inference engine swappable and mockable.
//!
//! # Failure semantics
//!
//! A chunk is analysed as one unit and fails as one unit; partial-chunk
//! results are not part of the contract. The coordinator answers a failed
//! chunk with neutral records and caches nothing from it.

use async_trait::async_trait;

use crate::Result;
use crate::types::AnalysisRecord;

/// Provider for batched text analysis.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Analyse a chunk of texts.
    ///
    /// Must answer exactly one record per input, in input order. The call
    /// may suspend on external computation; any timeout belongs inside the
    /// implementation and surfaces here as an error for the whole chunk.
    async fn infer_batch(&self, texts: &[&str]) -> Result<Vec<AnalysisRecord>>;
}
