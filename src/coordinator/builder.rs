//! Builder for configuring coordinator instances.

use std::sync::Arc;

use crate::cache::{CacheConfig, ResultCache};
use crate::sizing::{AdaptiveBatchSizer, SysinfoProbe, SystemLoadProbe};
use crate::traits::AnalysisProvider;
use crate::{MuninnError, Result};

use super::engine::BatchCoordinator;

/// Main entry point for creating coordinator instances.
pub struct Muninn;

impl Muninn {
    /// Create a new builder for configuring the coordinator.
    pub fn builder() -> MuninnBuilder {
        MuninnBuilder::new()
    }
}

/// Builder for configuring coordinator instances.
pub struct MuninnBuilder {
    provider: Option<Arc<dyn AnalysisProvider>>,
    cache_config: CacheConfig,
    load_probe: Option<Arc<dyn SystemLoadProbe>>,
}

impl MuninnBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            cache_config: CacheConfig::default(),
            load_probe: None,
        }
    }

    /// Set the inference provider (required).
    pub fn provider(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Configure the result cache.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Override the CPU load probe (default: [`SysinfoProbe`]).
    pub fn load_probe(mut self, probe: Arc<dyn SystemLoadProbe>) -> Self {
        self.load_probe = Some(probe);
        self
    }

    /// Build the coordinator.
    ///
    /// The cache and sizer created here are the shared per-process
    /// instances; hosts construct one coordinator at startup, hand it to
    /// request handlers, and drop it at shutdown.
    pub fn build(self) -> Result<BatchCoordinator> {
        let provider = self.provider.ok_or(MuninnError::NoProvider)?;
        if self.cache_config.capacity == 0 {
            return Err(MuninnError::Configuration(
                "cache capacity must be at least 1".to_string(),
            ));
        }

        let cache = Arc::new(ResultCache::new(&self.cache_config));
        let probe = self
            .load_probe
            .unwrap_or_else(|| Arc::new(SysinfoProbe::new()));
        let sizer = AdaptiveBatchSizer::new(probe);

        Ok(BatchCoordinator::new(cache, sizer, provider))
    }
}

impl Default for MuninnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
