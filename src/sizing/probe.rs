//! CPU load probing.
//!
//! Adaptive sizing wants a CPU reading but must never fail a request over
//! one. [`SystemLoadProbe`] is the seam that keeps platform probing
//! swappable and mockable; [`SysinfoProbe`] is the default implementation
//! and degrades to [`NEUTRAL_CPU_LOAD`] when the platform cannot report.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use sysinfo::System;
use tracing::debug;

/// Reading assumed when the platform cannot report CPU load.
pub const NEUTRAL_CPU_LOAD: f32 = 50.0;

/// How long a CPU reading is reused before re-sampling.
///
/// sysinfo computes usage as a delta between consecutive refreshes, so
/// refreshing on every request under bursty traffic yields near-zero,
/// jittery values. One second keeps readings meaningful without a
/// blocking sample per request; each request still makes exactly one
/// sizing decision with whatever reading is current.
const SAMPLE_REUSE_WINDOW: Duration = Duration::from_secs(1);

/// Source of the current CPU load.
pub trait SystemLoadProbe: Send + Sync {
    /// Probe name for logging/debugging.
    fn name(&self) -> &str;

    /// Current CPU load as a percentage in `[0, 100]`.
    ///
    /// Implementations must not fail; degrade to a neutral default
    /// instead.
    fn cpu_load_percent(&self) -> f32;
}

struct ProbeState {
    system: System,
    last_reading: f32,
    sampled_at: Option<Instant>,
}

/// Default probe backed by [`sysinfo`].
pub struct SysinfoProbe {
    state: Mutex<ProbeState>,
}

impl SysinfoProbe {
    /// Create a probe and establish the CPU usage baseline.
    pub fn new() -> Self {
        let mut system = System::new();
        // Usage is delta-based; the first meaningful reading needs a
        // prior refresh.
        system.refresh_cpu_usage();
        Self {
            state: Mutex::new(ProbeState {
                system,
                last_reading: NEUTRAL_CPU_LOAD,
                sampled_at: None,
            }),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLoadProbe for SysinfoProbe {
    fn name(&self) -> &str {
        "sysinfo"
    }

    fn cpu_load_percent(&self) -> f32 {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let stale = state
            .sampled_at
            .is_none_or(|at| at.elapsed() >= SAMPLE_REUSE_WINDOW);
        if stale {
            state.system.refresh_cpu_usage();
            let reading = state.system.global_cpu_usage();
            state.last_reading = if reading.is_finite() {
                reading.clamp(0.0, 100.0)
            } else {
                debug!("CPU load unavailable, using neutral default");
                NEUTRAL_CPU_LOAD
            };
            state.sampled_at = Some(Instant::now());
        }
        state.last_reading
    }
}

/// Probe answering a fixed reading.
///
/// For tests, and for hosts that prefer a constant over live probing.
pub struct FixedLoadProbe {
    load: f32,
}

impl FixedLoadProbe {
    /// Create a probe pinned to `load` percent, clamped into `[0, 100]`.
    pub fn new(load: f32) -> Self {
        Self {
            load: if load.is_finite() {
                load.clamp(0.0, 100.0)
            } else {
                NEUTRAL_CPU_LOAD
            },
        }
    }
}

impl SystemLoadProbe for FixedLoadProbe {
    fn name(&self) -> &str {
        "fixed"
    }

    fn cpu_load_percent(&self) -> f32 {
        self.load
    }
}
