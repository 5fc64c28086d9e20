//! TTL result store with capacity eviction and statistics.
//!
//! [`ResultCache`] maps normalized-text keys to analysis records. Entries
//! expire lazily: an expired entry is removed when a lookup observes it or
//! when a cleanup pass runs, never by a guaranteed background sweep. When
//! a store would overflow the configured capacity, expired entries are
//! removed first; if the cache is still full, the oldest tenth of entries
//! (by creation time) is evicted in one pass rather than one entry at a
//! time, so sustained write pressure does not thrash.
//!
//! Cache failure never propagates: `get` degrades to a miss and `set`
//! answers `false`. A poisoned lock is recovered rather than surfaced —
//! every mutation is a single `HashMap` call, so the guarded data is
//! structurally valid even after a panic elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::key::cache_key;
use crate::telemetry;
use crate::types::AnalysisRecord;

/// Default entry lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Default maximum number of entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Configuration for the result cache.
///
/// ```rust
/// # use muninn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .capacity(50_000)
///     .default_ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries. Default: 10,000.
    pub capacity: usize,
    /// Lifetime for entries stored without an explicit TTL. Default: 24h.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries.
    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Set the default time-to-live for stored entries.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub expired_cleanups: u64,
    /// Entries currently held, including expired ones not yet observed.
    pub size: usize,
    /// `hits + misses`.
    pub total_requests: u64,
    /// `hits / (hits + misses)`, 0.0 before the first lookup.
    pub hit_ratio: f64,
}

/// A stored record with its lifetime bookkeeping.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: AnalysisRecord,
    created_at: Instant,
    expires_at: Instant,
    hit_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Monotonic operation counters.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    sets: u64,
    evictions: u64,
    expired_cleanups: u64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    counters: Counters,
}

/// Keyed, TTL-expiring store of prior inference results.
///
/// One instance per process, shared across concurrent requests; the map
/// and its counters sit behind a single mutex. All methods take `&self`.
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    default_ttl: Duration,
    capacity: usize,
}

impl ResultCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                counters: Counters::default(),
            }),
            default_ttl: config.default_ttl,
            capacity: config.capacity,
        }
    }

    /// Lock the interior, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Look up the cached result for `text`.
    ///
    /// Answers `None` for unknown and expired entries. An expired entry is
    /// removed when observed and counted as both a miss and an expired
    /// cleanup. A hit bumps the entry's hit count.
    pub fn get(&self, text: &str) -> Option<AnalysisRecord> {
        let key = cache_key(text);
        let now = Instant::now();
        let mut inner = self.lock();
        let CacheInner { entries, counters } = &mut *inner;

        let expired = match entries.get_mut(&key) {
            None => {
                counters.misses += 1;
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                return None;
            }
            Some(entry) => {
                if entry.is_expired(now) {
                    true
                } else {
                    entry.hit_count += 1;
                    counters.hits += 1;
                    metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                    return Some(entry.value.clone());
                }
            }
        };

        if expired {
            entries.remove(&key);
            counters.misses += 1;
            counters.expired_cleanups += 1;
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
            metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(1);
        }
        None
    }

    /// Store `value` for `text`, overwriting any existing entry.
    ///
    /// `ttl` falls back to the configured default. When the cache is at
    /// capacity, expired entries are dropped first; if that is not enough,
    /// the oldest tenth of entries (by creation time, key as tie-break) is
    /// evicted. Answers `false` instead of surfacing an internal fault.
    pub fn set(&self, text: &str, value: AnalysisRecord, ttl: Option<Duration>) -> bool {
        let key = cache_key(text);
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = Instant::now();
        let mut inner = self.lock();
        let CacheInner { entries, counters } = &mut *inner;

        if entries.len() >= self.capacity {
            let removed = remove_expired(entries, now);
            if removed > 0 {
                counters.expired_cleanups += removed as u64;
                metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(removed as u64);
                debug!(removed, "dropped expired cache entries before store");
            }

            if entries.len() >= self.capacity {
                // A single entry at a time would thrash under sustained
                // write pressure; evict a batch.
                let batch = (self.capacity / 10).max(1);
                let evicted = evict_oldest(entries, batch);
                counters.evictions += evicted as u64;
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(evicted as u64);
                debug!(evicted, "evicted oldest cache entries");
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + ttl,
                hit_count: 0,
            },
        );
        counters.sets += 1;
        metrics::counter!(telemetry::CACHE_STORES_TOTAL).increment(1);
        true
    }

    /// Look up many texts at once.
    ///
    /// One slot per input, in input order: `Some` for hits, `None` for
    /// misses.
    pub fn get_many(&self, texts: &[&str]) -> Vec<Option<AnalysisRecord>> {
        texts.iter().map(|text| self.get(text)).collect()
    }

    /// Store many results at once. Answers how many were stored.
    pub fn set_many(&self, items: &[(&str, AnalysisRecord)], ttl: Option<Duration>) -> usize {
        items
            .iter()
            .filter(|(text, value)| self.set(text, value.clone(), ttl))
            .count()
    }

    /// Remove every expired entry now. Answers the count removed.
    ///
    /// Lazy expiry already keeps lookups correct; this is memory hygiene
    /// for long-lived processes.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let CacheInner { entries, counters } = &mut *inner;

        let removed = remove_expired(entries, now);
        if removed > 0 {
            counters.expired_cleanups += removed as u64;
            metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(removed as u64);
            debug!(removed, "cleanup pass dropped expired cache entries");
        }
        removed
    }

    /// Spawn a periodic [`cleanup_expired`](Self::cleanup_expired) sweep.
    ///
    /// The task holds only a weak reference and exits once the cache has
    /// been dropped. Aborting the returned handle stops it early.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn start_cleanup_task(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full interval after spawn.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else { break };
                cache.cleanup_expired();
            }
        })
    }

    /// Snapshot the statistics record.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let c = inner.counters;
        let total_requests = c.hits + c.misses;
        let hit_ratio = if total_requests == 0 {
            0.0
        } else {
            c.hits as f64 / total_requests as f64
        };
        CacheStats {
            hits: c.hits,
            misses: c.misses,
            sets: c.sets,
            evictions: c.evictions,
            expired_cleanups: c.expired_cleanups,
            size: inner.entries.len(),
            total_requests,
            hit_ratio,
        }
    }

    /// Remove all entries. Answers the count removed.
    ///
    /// Statistics counters are monotonic and survive a clear.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        info!(count, "cache cleared");
        count
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

/// Remove every expired entry from the map. Answers the count removed.
fn remove_expired(entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}

/// Evict the `count` oldest entries by creation time, keys breaking ties.
fn evict_oldest(entries: &mut HashMap<String, CacheEntry>, count: usize) -> usize {
    if count == 0 || entries.is_empty() {
        return 0;
    }

    let mut by_age: Vec<(Instant, String)> = entries
        .iter()
        .map(|(key, entry)| (entry.created_at, key.clone()))
        .collect();
    by_age.sort();

    let mut evicted = 0;
    for (_, key) in by_age.into_iter().take(count) {
        entries.remove(&key);
        evicted += 1;
    }
    evicted
}
