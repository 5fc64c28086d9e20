//! Caching subsystem.
//!
//! Two layers:
//!
//! - [`key`] — canonical key derivation: texts are normalized (lowercased,
//!   trimmed, whitespace-collapsed) and hashed, so trivially different
//!   spellings of the same text share one entry.
//!
//! - [`store`] — [`ResultCache`], the TTL store itself: lazy expiry,
//!   oldest-first capacity eviction, and monotonic hit/miss statistics.
//!
//! The cache is in-memory and process-local, shared across requests via a
//! single instance owned by the coordinator. Its narrow
//! `get`/`set`/`stats`/`clear` surface is deliberate: a shared external
//! store can replace the backing map without touching callers.

pub mod key;
pub mod store;

pub use key::{cache_key, normalize};
pub use store::{CacheConfig, CacheStats, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL, ResultCache};
