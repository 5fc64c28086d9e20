//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `source` — how the batch size was chosen: "user" or "adaptive"
//! - `status` — chunk outcome: "ok" or "error"

/// Total orchestration runs.
///
/// Labels: `source` ("user" | "adaptive").
pub const REQUESTS_TOTAL: &str = "muninn_requests_total";

/// Chunk size chosen per run.
///
/// Labels: `source`.
pub const BATCH_SIZE: &str = "muninn_batch_size";

/// Total chunks dispatched to the inference provider.
///
/// Labels: `status` ("ok" | "error"). A chunk counts as "error" when the
/// provider failed and its texts fell back to neutral records.
pub const CHUNKS_TOTAL: &str = "muninn_chunks_total";

/// Total cache hits.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total cache misses (including expired entries observed by a lookup).
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total successful stores into the cache.
pub const CACHE_STORES_TOTAL: &str = "muninn_cache_stores_total";

/// Total entries evicted by capacity pressure (oldest-first batches).
pub const CACHE_EVICTIONS_TOTAL: &str = "muninn_cache_evictions_total";

/// Total expired entries removed, lazily or by a cleanup pass.
pub const CACHE_EXPIRED_TOTAL: &str = "muninn_cache_expired_total";
