//! Chunking and batch-size configuration.
//!
//! A batch size is computed once per orchestration run — before any chunk
//! executes — and is never revised mid-run, however later chunks perform.
//! [`BatchConfig`] is the immutable record of that decision. Chunks are
//! contiguous, order-preserving slices of the pending texts.

use serde::Serialize;
use tracing::info;

/// Smallest chunk ever dispatched to the inference provider.
pub const MIN_BATCH_SIZE: usize = 4;

/// Chunk size used when no better signal exists.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Largest chunk ever dispatched to the inference provider.
pub const MAX_BATCH_SIZE: usize = 32;

/// How the batch size for a run was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchSource {
    /// Caller supplied an explicit size (clamped into bounds).
    User,
    /// Computed from system load and the cache hit ratio.
    Adaptive,
}

impl BatchSource {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchSource::User => "user",
            BatchSource::Adaptive => "adaptive",
        }
    }
}

/// Immutable record of the sizing decision for one run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchConfig {
    /// Final chunk size, always within `[MIN_BATCH_SIZE, MAX_BATCH_SIZE]`.
    pub batch_size: usize,
    /// Where the size came from.
    pub source: BatchSource,
    /// Caller-requested size before clamping. `None` for adaptive runs.
    pub original_request: Option<usize>,
}

impl BatchConfig {
    /// Build a config from a caller-supplied size, clamped into bounds.
    pub fn from_user(requested: usize) -> Self {
        let clamped = requested.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        if clamped != requested {
            info!(requested, clamped, "batch size clamped");
        }
        Self {
            batch_size: clamped,
            source: BatchSource::User,
            original_request: Some(requested),
        }
    }

    /// Build a config from an adaptively computed size.
    ///
    /// The sizer already respects the bounds; clamp again anyway.
    pub fn from_adaptive(computed: usize) -> Self {
        Self {
            batch_size: computed.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE),
            source: BatchSource::Adaptive,
            original_request: None,
        }
    }
}

/// Split `items` into order-preserving chunks of at most `size`.
///
/// A `size` of 0 falls back to [`DEFAULT_BATCH_SIZE`]. The last chunk may
/// be shorter than `size`.
pub fn chunk_items<T>(items: &[T], size: usize) -> Vec<&[T]> {
    let size = if size == 0 { DEFAULT_BATCH_SIZE } else { size };
    items.chunks(size).collect()
}

/// Number of chunks needed for `total` items at the given size.
///
/// 0 when `total` is 0; a `size` of 0 falls back to [`DEFAULT_BATCH_SIZE`].
pub fn num_batches(total: usize, size: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let size = if size == 0 { DEFAULT_BATCH_SIZE } else { size };
    total.div_ceil(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_splits_with_short_tail() {
        let items = [1, 2, 3, 4, 5];
        let chunks = chunk_items(&items, 2);
        assert_eq!(chunks, vec![&[1, 2][..], &[3, 4][..], &[5][..]]);
    }

    #[test]
    fn chunk_zero_size_uses_default() {
        let items: Vec<u32> = (0..20).collect();
        let chunks = chunk_items(&items, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), DEFAULT_BATCH_SIZE);
        assert_eq!(chunks[2].len(), 4);
    }

    #[test]
    fn chunk_preserves_order() {
        let items: Vec<u32> = (0..17).collect();
        let flattened: Vec<u32> = chunk_items(&items, 5)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        assert_eq!(flattened, items);
    }

    #[test]
    fn num_batches_rounds_up() {
        assert_eq!(num_batches(5, 2), 3);
        assert_eq!(num_batches(6, 2), 3);
        assert_eq!(num_batches(1, 32), 1);
    }

    #[test]
    fn num_batches_empty_is_zero() {
        assert_eq!(num_batches(0, 8), 0);
        assert_eq!(num_batches(0, 0), 0);
    }
}
