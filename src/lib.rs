//! Muninn - batched inference coordination with result caching
//!
//! This crate wraps a batched text-analysis provider with the plumbing a
//! service needs around it: a TTL result cache keyed on normalized text,
//! an adaptive batch-size policy driven by CPU load and cache hit ratio,
//! and a coordinator that fans uncached work out in bounded chunks while
//! guaranteeing results come back in original input order.
//!
//! The actual inference engine stays behind the [`AnalysisProvider`]
//! trait; muninn only keys, times, counts, and reorders.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use muninn::{AnalysisProvider, AnalysisRecord, Muninn, Result};
//!
//! struct EchoProvider;
//!
//! #[async_trait::async_trait]
//! impl AnalysisProvider for EchoProvider {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn infer_batch(&self, texts: &[&str]) -> Result<Vec<AnalysisRecord>> {
//!         Ok(texts.iter().map(|_| AnalysisRecord::neutral()).collect())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let coordinator = Muninn::builder()
//!         .provider(Arc::new(EchoProvider))
//!         .build()?;
//!
//!     let (results, stats) = coordinator
//!         .process(&["markets rallied today", "fed holds rates"], None)
//!         .await;
//!
//!     assert_eq!(results.len(), 2);
//!     println!("{} of {} answered from cache", stats.cached_texts, stats.total_texts);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod coordinator;
pub mod error;
pub mod sizing;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use error::{MuninnError, Result};

pub use coordinator::{BatchCoordinator, Muninn, MuninnBuilder};
pub use traits::AnalysisProvider;

pub use batch::{
    BatchConfig, BatchSource, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE,
};
pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use sizing::{
    AdaptiveBatchSizer, FixedLoadProbe, HIGH_CPU_THRESHOLD, MEDIUM_CPU_THRESHOLD,
    NEUTRAL_CPU_LOAD, SysinfoProbe, SystemLoadProbe, SystemMetrics,
};
pub use types::{AnalysisRecord, BatchingStats};
