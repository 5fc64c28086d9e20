//! Adaptive batch sizing.
//!
//! Computes, once per orchestration run, how many texts go into each
//! inference call. The decision is a deterministic single pass: CPU load
//! picks a base size, the cache hit ratio nudges it, and the result is
//! clamped into bounds. No learning and no mid-run revision — two runs
//! under the same conditions size the same way.

mod probe;

pub use probe::{FixedLoadProbe, NEUTRAL_CPU_LOAD, SysinfoProbe, SystemLoadProbe};

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::batch::{BatchConfig, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE};

/// CPU load above which chunks shrink to the minimum size.
pub const HIGH_CPU_THRESHOLD: f32 = 75.0;

/// CPU load above which chunks stay at the default size.
pub const MEDIUM_CPU_THRESHOLD: f32 = 50.0;

/// System signals sampled for one sizing decision.
///
/// Sampled fresh per decision and never reused across runs.
#[derive(Debug, Clone)]
pub struct SystemMetrics {
    /// CPU load percentage in `[0, 100]`.
    pub cpu_load_percent: f32,
    /// Texts awaiting inference in the run being sized.
    pub pending_count: usize,
    /// Cache hit ratio in `[0, 1]` at decision time.
    pub cache_hit_ratio: f64,
}

#[derive(Debug, Clone)]
struct Decision {
    metrics: SystemMetrics,
    batch_size: usize,
}

/// Computes chunk sizes from live system signals.
///
/// One instance per process, shared across requests; only the last
/// decision is retained, for observability.
pub struct AdaptiveBatchSizer {
    probe: Arc<dyn SystemLoadProbe>,
    last: Mutex<Option<Decision>>,
}

impl AdaptiveBatchSizer {
    /// Create a sizer reading CPU load from `probe`.
    pub fn new(probe: Arc<dyn SystemLoadProbe>) -> Self {
        Self {
            probe,
            last: Mutex::new(None),
        }
    }

    fn lock_last(&self) -> MutexGuard<'_, Option<Decision>> {
        match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Compute the chunk size for one run.
    ///
    /// Called exactly once per run, before any chunk executes; the answer
    /// applies to every chunk of that run.
    ///
    /// Base size by CPU load: above [`HIGH_CPU_THRESHOLD`] the minimum,
    /// above [`MEDIUM_CPU_THRESHOLD`] the default, otherwise twice the
    /// default (capped). A hit ratio above 0.7 adds 4 — mostly-cached
    /// traffic means little inference work per chunk — and one below 0.2
    /// subtracts 2.
    pub fn compute_batch_size(&self, pending_count: usize, cache_hit_ratio: f64) -> BatchConfig {
        let cpu = self.probe.cpu_load_percent();
        let metrics = SystemMetrics {
            cpu_load_percent: cpu,
            pending_count,
            cache_hit_ratio,
        };

        let (base, reason) = if cpu > HIGH_CPU_THRESHOLD {
            (MIN_BATCH_SIZE, "high_cpu")
        } else if cpu > MEDIUM_CPU_THRESHOLD {
            (DEFAULT_BATCH_SIZE, "medium_cpu")
        } else {
            ((DEFAULT_BATCH_SIZE * 2).min(MAX_BATCH_SIZE), "low_cpu")
        };

        let adjusted = if cache_hit_ratio > 0.7 {
            (base + 4).min(MAX_BATCH_SIZE)
        } else if cache_hit_ratio < 0.2 {
            base.saturating_sub(2).max(MIN_BATCH_SIZE)
        } else {
            base
        };

        let config = BatchConfig::from_adaptive(adjusted);

        info!(
            batch_size = config.batch_size,
            cpu_load = cpu,
            cache_hit_ratio,
            pending_count,
            reason,
            "adaptive batch size"
        );

        *self.lock_last() = Some(Decision {
            metrics,
            batch_size: config.batch_size,
        });
        config
    }

    /// Metrics sampled by the most recent decision.
    pub fn last_metrics(&self) -> Option<SystemMetrics> {
        self.lock_last().as_ref().map(|d| d.metrics.clone())
    }

    /// Size chosen by the most recent decision, or the default before any.
    pub fn last_batch_size(&self) -> usize {
        self.lock_last()
            .as_ref()
            .map_or(DEFAULT_BATCH_SIZE, |d| d.batch_size)
    }
}
