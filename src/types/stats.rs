//! Per-run orchestration statistics.

use serde::Serialize;

use crate::batch::BatchSource;

/// Read-only summary of one orchestration run.
///
/// Emitted alongside the ordered results for observability; nothing in
/// later runs consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct BatchingStats {
    /// Number of input texts.
    pub total_texts: usize,
    /// Inputs answered from the cache.
    pub cached_texts: usize,
    /// Inputs sent to the inference provider.
    pub uncached_texts: usize,
    /// Chunk size used for this run (0 for an empty run).
    pub batch_size: usize,
    /// Chunks dispatched.
    pub num_batches: usize,
    /// How the size was chosen. `None` only for the empty-input short
    /// circuit, where no sizing decision exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_source: Option<BatchSource>,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl BatchingStats {
    /// Trivial stats for an empty input list.
    pub fn empty() -> Self {
        Self {
            total_texts: 0,
            cached_texts: 0,
            uncached_texts: 0,
            batch_size: 0,
            num_batches: 0,
            batch_source: None,
            elapsed_ms: 0,
        }
    }

    /// Share of this run's inputs answered from cache, in `[0.0, 1.0]`.
    pub fn cache_hit_ratio(&self) -> f64 {
        if self.total_texts == 0 {
            0.0
        } else {
            self.cached_texts as f64 / self.total_texts as f64
        }
    }
}
