//! Builder for configuring engine instances

use std::sync::Arc;
use std::time::Duration;

use super::StatEngine;
use crate::aggregate::{AggregationConfig, Aggregator};
use crate::cache::{DomainCache, DomainCacheConfig};
use crate::config::Config;
use crate::providers::{RetryConfig, RetryingProvider, RosterProvider, StatsProvider};
use crate::resolve::{NameScorer, Resolver, ResolverConfig};
use crate::{Result, StatlineError};

/// Builder for configuring engine instances.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use statline::{StatEngine, providers::StaticProvider};
/// # fn demo(provider: Arc<StaticProvider>) -> statline::Result<()> {
/// let engine = StatEngine::builder()
///     .provider(provider)
///     .fetch_timeout(std::time::Duration::from_secs(5))
///     .build()?;
/// # Ok(()) }
/// ```
pub struct StatEngineBuilder {
    rosters: Option<Arc<dyn RosterProvider>>,
    stats: Option<Arc<dyn StatsProvider>>,
    cache: Option<Arc<DomainCache>>,
    cache_config: DomainCacheConfig,
    resolver_config: ResolverConfig,
    aggregation_config: AggregationConfig,
    retry: Option<RetryConfig>,
    scorer: Option<Arc<dyn NameScorer>>,
}

impl StatEngineBuilder {
    pub fn new() -> Self {
        Self {
            rosters: None,
            stats: None,
            cache: None,
            cache_config: DomainCacheConfig::default(),
            resolver_config: ResolverConfig::default(),
            aggregation_config: AggregationConfig::default(),
            retry: None,
            scorer: None,
        }
    }

    /// Apply every section of a loaded [`Config`].
    pub fn config(mut self, config: &Config) -> Self {
        self.cache_config = config.cache_config();
        self.resolver_config = config.resolver_config();
        self.aggregation_config = config.aggregation_config();
        self.retry = Some(config.retry_config());
        self
    }

    /// Use one provider for both rosters and stats.
    pub fn provider<P>(mut self, provider: Arc<P>) -> Self
    where
        P: RosterProvider + StatsProvider + 'static,
    {
        self.rosters = Some(provider.clone());
        self.stats = Some(provider);
        self
    }

    /// Set the roster and name-lookup provider.
    pub fn roster_provider(mut self, provider: Arc<dyn RosterProvider>) -> Self {
        self.rosters = Some(provider);
        self
    }

    /// Set the stats provider.
    pub fn stats_provider(mut self, provider: Arc<dyn StatsProvider>) -> Self {
        self.stats = Some(provider);
        self
    }

    /// Share an existing cache instead of creating one.
    ///
    /// The cache's own TTL policy and capacity win over
    /// [`cache_config`](Self::cache_config).
    pub fn cache(mut self, cache: Arc<DomainCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_config(mut self, config: DomainCacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    pub fn aggregation_config(mut self, config: AggregationConfig) -> Self {
        self.aggregation_config = config;
        self
    }

    /// Wrap both providers in a [`RetryingProvider`].
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Replace the configured name scorer.
    pub fn scorer(mut self, scorer: Arc<dyn NameScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Bound every upstream call.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_config.fetch_timeout = timeout;
        self.aggregation_config.fetch_timeout = timeout;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<StatEngine> {
        let Some(mut rosters) = self.rosters else {
            return Err(StatlineError::Configuration(
                "no roster provider configured".to_string(),
            ));
        };
        let Some(mut stats) = self.stats else {
            return Err(StatlineError::Configuration(
                "no stats provider configured".to_string(),
            ));
        };

        if let Some(retry) = self.retry.filter(|r| r.max_attempts > 1) {
            rosters = Arc::new(RetryingProvider::new(rosters, retry.clone()));
            stats = Arc::new(RetryingProvider::new(stats, retry));
        }

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(DomainCache::with_config(&self.cache_config)));

        let mut resolver = Resolver::new(Arc::clone(&cache), rosters, self.resolver_config);
        if let Some(scorer) = self.scorer {
            resolver = resolver.with_scorer(scorer);
        }
        let aggregator = Aggregator::new(Arc::clone(&cache), stats, self.aggregation_config);

        Ok(StatEngine::new(cache, resolver, aggregator))
    }
}

impl Default for StatEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
