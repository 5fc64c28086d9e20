//! The four-phase orchestration engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::batch::{self, BatchConfig};
use crate::cache::{CacheStats, ResultCache};
use crate::sizing::AdaptiveBatchSizer;
use crate::telemetry;
use crate::traits::AnalysisProvider;
use crate::types::{AnalysisRecord, BatchingStats};
use crate::{MuninnError, Result};

/// Top-level coordinator for batched, cached analysis.
///
/// One instance per process, shared across request handlers. All methods
/// take `&self`; the cache and sizer tolerate interleaved access. Two
/// concurrent runs over the same uncached text may both reach the
/// provider and both store — last write wins, which is accepted duplicate
/// work rather than a correctness problem.
pub struct BatchCoordinator {
    cache: Arc<ResultCache>,
    sizer: AdaptiveBatchSizer,
    provider: Arc<dyn AnalysisProvider>,
}

impl BatchCoordinator {
    pub(crate) fn new(
        cache: Arc<ResultCache>,
        sizer: AdaptiveBatchSizer,
        provider: Arc<dyn AnalysisProvider>,
    ) -> Self {
        Self {
            cache,
            sizer,
            provider,
        }
    }

    /// Analyse `texts`, answering one record per input in input order.
    ///
    /// `batch_size` overrides adaptive sizing (clamped into bounds).
    ///
    /// This call does not fail: cache faults degrade to misses, a failed
    /// chunk yields neutral records for its texts (and is not cached), and
    /// an empty input answers immediately with empty results and trivial
    /// stats.
    ///
    /// Guarantees: `results.len() == texts.len()`, `results[i]` answers
    /// `texts[i]`, and a text answered from cache never reaches the
    /// provider.
    pub async fn process(
        &self,
        texts: &[&str],
        batch_size: Option<usize>,
    ) -> (Vec<AnalysisRecord>, BatchingStats) {
        let started = Instant::now();
        let total = texts.len();

        if total == 0 {
            return (Vec::new(), BatchingStats::empty());
        }

        // Phase 1: cache lookup. Partition the indices before any
        // inference happens.
        let mut cached: HashMap<usize, AnalysisRecord> = HashMap::new();
        let mut pending_indices: Vec<usize> = Vec::new();
        let mut pending_texts: Vec<&str> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(text) {
                Some(record) => {
                    cached.insert(i, record);
                }
                None => {
                    pending_indices.push(i);
                    pending_texts.push(text);
                }
            }
        }

        let cached_count = cached.len();
        let pending_count = pending_texts.len();
        debug!(hits = cached_count, total, "cache lookup complete");

        // Phase 2: one sizing decision for the whole run.
        let config = match batch_size {
            Some(requested) => BatchConfig::from_user(requested),
            None => {
                let hit_ratio = self.cache.stats().hit_ratio;
                self.sizer.compute_batch_size(pending_count, hit_ratio)
            }
        };
        let num_batches = batch::num_batches(pending_count, config.batch_size);

        metrics::counter!(telemetry::REQUESTS_TOTAL, "source" => config.source.as_str())
            .increment(1);
        metrics::histogram!(telemetry::BATCH_SIZE, "source" => config.source.as_str())
            .record(config.batch_size as f64);

        // Phase 3: dispatch pending texts chunk by chunk. Each chunk goes
        // to the provider as one unit, never split or merged.
        let mut new_results: HashMap<usize, AnalysisRecord> = HashMap::new();
        let mut offset = 0usize;

        for (chunk_no, chunk) in batch::chunk_items(&pending_texts, config.batch_size)
            .into_iter()
            .enumerate()
        {
            debug!(
                chunk = chunk_no + 1,
                num_batches,
                len = chunk.len(),
                "dispatching chunk"
            );

            match self.infer_chunk(chunk).await {
                Ok(records) => {
                    metrics::counter!(telemetry::CHUNKS_TOTAL, "status" => "ok").increment(1);
                    for (j, record) in records.into_iter().enumerate() {
                        let original = pending_indices[offset + j];
                        self.cache.set(texts[original], record.clone(), None);
                        new_results.insert(original, record);
                    }
                }
                Err(err) => {
                    // Whole-chunk fallback: neutral records, nothing
                    // cached, no automatic retry. Chunks already stored
                    // stay stored.
                    metrics::counter!(telemetry::CHUNKS_TOTAL, "status" => "error").increment(1);
                    warn!(
                        chunk = chunk_no + 1,
                        len = chunk.len(),
                        error = %err,
                        "chunk inference failed, substituting neutral records"
                    );
                    for j in 0..chunk.len() {
                        let original = pending_indices[offset + j];
                        new_results.insert(original, AnalysisRecord::neutral());
                    }
                }
            }
            offset += chunk.len();
        }

        // Phase 4: merge in original input order. The final fallback is
        // unreachable when phases 1-3 behaved; the merge must not be
        // where a run learns to fail.
        let mut results = Vec::with_capacity(total);
        for i in 0..total {
            let record = cached
                .remove(&i)
                .or_else(|| new_results.remove(&i))
                .unwrap_or_else(AnalysisRecord::neutral);
            results.push(record);
        }

        let stats = BatchingStats {
            total_texts: total,
            cached_texts: cached_count,
            uncached_texts: pending_count,
            batch_size: config.batch_size,
            num_batches,
            batch_source: Some(config.source),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            total,
            cached = cached_count,
            num_batches,
            batch_size = config.batch_size,
            source = config.source.as_str(),
            elapsed_ms = stats.elapsed_ms,
            "batch run complete"
        );

        (results, stats)
    }

    /// Analyse a single text.
    pub async fn process_one(&self, text: &str) -> AnalysisRecord {
        let (mut results, _) = self.process(&[text], None).await;
        results.pop().unwrap_or_else(AnalysisRecord::neutral)
    }

    /// Call the provider for one chunk, enforcing the length contract.
    async fn infer_chunk(&self, chunk: &[&str]) -> Result<Vec<AnalysisRecord>> {
        let records = self.provider.infer_batch(chunk).await?;
        if records.len() != chunk.len() {
            return Err(MuninnError::ResultCountMismatch {
                expected: chunk.len(),
                got: records.len(),
            });
        }
        Ok(records)
    }

    /// Snapshot of cache statistics. Read-only, administrative.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cache entry. Answers the count removed.
    ///
    /// Administrative/testing surface — gate it behind an operator-only
    /// path in a real deployment.
    pub fn cache_clear(&self) -> usize {
        self.cache.clear()
    }

    /// Spawn a periodic expired-entry sweep on the shared cache.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn spawn_cache_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        self.cache.start_cleanup_task(every)
    }
}
