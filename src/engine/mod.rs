//! The engine façade.
//!
//! [`StatEngine`] owns one shared [`DomainCache`], one [`Resolver`] (and its
//! player index) and one [`Aggregator`]. It is the single entry point for
//! callers; clone the `Arc` it lives in to share it across tasks.

mod builder;

pub use builder::StatEngineBuilder;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::aggregate::{Aggregator, Leaderboard, LeadersRequest};
use crate::cache::{CacheStatsSnapshot, DomainCache};
use crate::query::{QueryEntities, QueryPlan};
use crate::resolve::{ResolutionResult, ResolveContext, Resolver};
use crate::{Result, StatlineError};

/// Shared statistics engine.
pub struct StatEngine {
    cache: Arc<DomainCache>,
    resolver: Resolver,
    aggregator: Aggregator,
}

impl StatEngine {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> StatEngineBuilder {
        StatEngineBuilder::new()
    }

    pub(crate) fn new(cache: Arc<DomainCache>, resolver: Resolver, aggregator: Aggregator) -> Self {
        Self {
            cache,
            resolver,
            aggregator,
        }
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<DomainCache> {
        &self.cache
    }

    // ===== Resolution =====

    /// Resolve a free-text player name.
    pub async fn resolve(&self, sport: &str, name: &str) -> Result<ResolutionResult> {
        self.resolver.resolve(sport, name).await
    }

    /// Resolve a name, breaking collisions with hints from the question.
    pub async fn resolve_with_context(
        &self,
        sport: &str,
        name: &str,
        context: &ResolveContext,
    ) -> Result<ResolutionResult> {
        self.resolver
            .resolve_with_context(sport, name, context)
            .await
    }

    // ===== Classification =====

    /// Classify a question. Never touches the cache or upstream.
    pub fn classify(&self, question: &str, entities: &QueryEntities) -> Result<QueryPlan> {
        let plan = crate::query::classify(question, entities)?;
        debug!(query_type = %plan.query_type, "classified question");
        Ok(plan)
    }

    // ===== Aggregation =====

    /// League leaders on `metric`, optionally restricted to one position.
    pub async fn get_leaders(
        &self,
        sport: &str,
        metric: &str,
        position_filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Leaderboard> {
        let mut request = LeadersRequest::new(sport, metric);
        if let Some(position) = position_filter {
            request = request.position(position);
        }
        request.limit = limit;
        self.leaders(&request).await
    }

    /// Rank every indexed player of the request's sport.
    ///
    /// Fails with the upstream error when the sport's team list cannot be
    /// fetched, rather than ranking an empty league.
    pub async fn leaders(&self, request: &LeadersRequest) -> Result<Leaderboard> {
        if request.sport.trim().is_empty() {
            return Err(StatlineError::InvalidInput("sport is empty".to_string()));
        }
        let candidates = self.resolver.players(&request.sport).await?;
        self.aggregator.leaders(request, &candidates).await
    }

    /// Run the ranking a classified plan asks for.
    pub async fn leaders_for_plan(&self, sport: &str, plan: &QueryPlan) -> Result<Leaderboard> {
        self.leaders(&LeadersRequest::from_plan(sport, plan)?).await
    }

    // ===== Cache management =====

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// Drop every cached entry, the player index and the statistics.
    pub fn clear_all(&self) {
        self.cache.clear_all();
        self.resolver.clear_index();
    }

    /// Remove expired entries; returns how many were removed.
    pub fn clear_expired(&self) -> usize {
        self.cache.clear_expired()
    }

    pub fn reset_stats(&self) {
        self.cache.reset_stats();
    }

    /// Sweep expired entries every `interval` on a background task.
    ///
    /// Runs until the returned handle is aborted or the runtime shuts down.
    pub fn spawn_maintenance(&self, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.clear_expired();
                if removed > 0 {
                    info!(removed, "maintenance sweep removed expired entries");
                }
            }
        })
    }
}
