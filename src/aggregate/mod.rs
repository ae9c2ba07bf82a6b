//! League-wide ranking on one metric.
//!
//! The [`Aggregator`] takes a candidate set (normally the resolver's player
//! index for a sport), reads each candidate's stat line through the domain
//! cache, fetching only the misses, and turns the values into a
//! [`Leaderboard`] with competition ranks (1, 2, 2, 4).
//!
//! Order of operations is fixed: rank the full sorted set, then apply the
//! threshold, then the limit. A threshold therefore never renumbers ranks.
//!
//! Per-candidate fetch failures are annotations on the result; only a run
//! where every candidate failed is an error.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{DomainCache, normalize_sport};
use crate::providers::{StatsProvider, bounded};
use crate::query::{QueryPlan, SortOrder, Threshold};
use crate::types::{PlayerRecord, StatLine, canonical_metric, metric_components};
use crate::{Result, StatlineError};

/// Season used when a request names none.
pub const DEFAULT_SEASON: &str = "2024";

/// Aggregation tuning.
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Entries returned when a request sets neither a limit nor a
    /// threshold. Default: 10.
    pub default_limit: usize,
    /// Stat fetches in flight at once. Default: 8.
    pub max_concurrent_fetches: usize,
    /// Bound on each upstream call. Default: 10s.
    pub fetch_timeout: Duration,
    /// Season used when a request names none. Default: `"2024"`.
    pub default_season: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_concurrent_fetches: 8,
            fetch_timeout: Duration::from_secs(10),
            default_season: DEFAULT_SEASON.to_string(),
        }
    }
}

impl AggregationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_limit(mut self, n: usize) -> Self {
        self.default_limit = n;
        self
    }

    pub fn max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn default_season(mut self, season: impl Into<String>) -> Self {
        self.default_season = season.into();
        self
    }
}

/// A ranking request.
///
/// ```rust
/// # use statline::aggregate::LeadersRequest;
/// let request = LeadersRequest::new("NFL", "sacks")
///     .season("2023")
///     .position("DE")
///     .position("LB")
///     .limit(5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadersRequest {
    pub sport: String,
    /// Defaults to the configured season.
    #[serde(default)]
    pub season: Option<String>,
    pub metric: String,
    /// Position abbreviations; empty means every position.
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub threshold: Option<Threshold>,
    /// Defaults to the configured limit, or no limit when a threshold is
    /// set.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: SortOrder,
}

impl LeadersRequest {
    pub fn new(sport: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            sport: sport.into(),
            metric: metric.into(),
            ..Self::default()
        }
    }

    /// Build the ranking a classified plan asks for.
    ///
    /// Fails with `InvalidInput` when the plan is not a ranking or names no
    /// metric.
    pub fn from_plan(sport: impl Into<String>, plan: &QueryPlan) -> Result<Self> {
        if !plan.query_type.is_ranking() {
            return Err(StatlineError::InvalidInput(format!(
                "{} is not a ranking query",
                plan.query_type
            )));
        }
        let metric = plan.metrics.first().ok_or_else(|| {
            StatlineError::InvalidInput("ranking query names no metric".to_string())
        })?;
        Ok(Self {
            sport: sport.into(),
            season: plan.filters.season.clone(),
            metric: metric.clone(),
            positions: plan.filters.positions.clone(),
            threshold: plan.filters.threshold,
            limit: plan.filters.limit,
            order: plan.filters.order,
        })
    }

    pub fn season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.positions.push(position.into());
        self
    }

    pub fn threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rank smallest values first.
    pub fn ascending(mut self) -> Self {
        self.order = SortOrder::Ascending;
        self
    }
}

/// One ranked player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub player: Arc<PlayerRecord>,
    pub value: f64,
}

/// A candidate left out because its stats could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateFailure {
    pub player_id: String,
    pub name: String,
    pub error: String,
}

/// Ranked result of a [`LeadersRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub sport: String,
    pub season: String,
    /// Canonical metric name.
    pub metric: String,
    pub order: SortOrder,
    pub entries: Vec<RankedEntry>,
    /// Mean over every candidate with a value, before threshold and limit.
    pub league_average: Option<f64>,
    /// Candidates considered after position filtering.
    pub candidates: usize,
    /// Candidates left out because their fetch failed.
    pub excluded: usize,
    pub failures: Vec<CandidateFailure>,
}

impl Leaderboard {
    /// Whether some candidates were left out.
    pub fn is_partial(&self) -> bool {
        self.excluded > 0
    }
}

/// Fans stat lookups out over candidates and ranks the results.
pub struct Aggregator {
    cache: Arc<DomainCache>,
    provider: Arc<dyn StatsProvider>,
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(
        cache: Arc<DomainCache>,
        provider: Arc<dyn StatsProvider>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Rank `candidates` on the request's metric.
    pub async fn leaders(
        &self,
        request: &LeadersRequest,
        candidates: &[Arc<PlayerRecord>],
    ) -> Result<Leaderboard> {
        let metric = canonical_metric(&request.metric);
        if metric.is_empty() {
            return Err(StatlineError::InvalidInput("metric is empty".to_string()));
        }
        // a threshold already bounds the result; cutting it further would
        // drop qualifying players
        let limit = match (request.limit, request.threshold) {
            (Some(n), _) => Some(n),
            (None, Some(_)) => None,
            (None, None) => Some(self.config.default_limit),
        };
        if limit == Some(0) {
            return Err(StatlineError::InvalidInput(
                "limit must be positive".to_string(),
            ));
        }
        let sport = normalize_sport(&request.sport);
        let season = request
            .season
            .clone()
            .unwrap_or_else(|| self.config.default_season.clone());
        let positions: Vec<String> = request
            .positions
            .iter()
            .map(|p| p.trim().to_uppercase())
            .collect();
        let components = metric_components(&metric);

        let pool: Vec<Arc<PlayerRecord>> = candidates
            .iter()
            .filter(|p| positions.is_empty() || positions.contains(&p.position.to_uppercase()))
            .cloned()
            .collect();

        let lines: Vec<(Arc<PlayerRecord>, Result<StatLine>)> = stream::iter(pool.iter())
            .map(|player| {
                let (sport, season, components) = (&sport, &season, &components);
                async move {
                    let line = self.stat_line(sport, season, player, components).await;
                    (Arc::clone(player), line)
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut failures = Vec::new();
        let mut values: Vec<(Arc<PlayerRecord>, f64)> = Vec::new();
        for (player, line) in lines {
            match line {
                Ok(line) => {
                    if let Some(v) = line.value(&metric).filter(|v| v.is_finite()) {
                        values.push((player, v));
                    }
                }
                Err(e) => {
                    warn!(player = %player.id, metric = %metric, error = %e, "excluding candidate");
                    failures.push(CandidateFailure {
                        player_id: player.id.clone(),
                        name: player.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !pool.is_empty() && failures.len() == pool.len() {
            return Err(StatlineError::AggregationFailed {
                failed: failures.len(),
            });
        }

        let league_average = (!values.is_empty())
            .then(|| values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64);

        let mut entries = rank(values, request.order);
        if let Some(threshold) = request.threshold {
            entries.retain(|e| threshold.admits(e.value));
        }
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        info!(
            sport = %sport,
            season = %season,
            metric = %metric,
            candidates = pool.len(),
            ranked = entries.len(),
            failed = failures.len(),
            "built leaderboard"
        );

        Ok(Leaderboard {
            sport,
            season,
            metric,
            order: request.order,
            entries,
            league_average,
            candidates: pool.len(),
            excluded: failures.len(),
            failures,
        })
    }

    /// Stat line for one candidate, cache first.
    async fn stat_line(
        &self,
        sport: &str,
        season: &str,
        player: &PlayerRecord,
        components: &[String],
    ) -> Result<StatLine> {
        if let Some(line) = self.cache.get_stats(sport, &player.id, season, components) {
            return Ok(line);
        }
        let line = bounded(
            "fetch_player_stats",
            self.config.fetch_timeout,
            self.provider
                .fetch_player_stats(sport, &player.id, season, components),
        )
        .await?;
        self.cache
            .set_stats(sport, &player.id, season, components, line.clone());
        Ok(line)
    }
}

/// Sort by value in `order`, then name, then id, and assign competition
/// ranks over the whole sorted set.
pub fn rank(mut values: Vec<(Arc<PlayerRecord>, f64)>, order: SortOrder) -> Vec<RankedEntry> {
    values.sort_by(|(pa, va), (pb, vb)| {
        let by_value = va.partial_cmp(vb).unwrap_or(Ordering::Equal);
        let by_value = match order {
            SortOrder::Descending => by_value.reverse(),
            SortOrder::Ascending => by_value,
        };
        by_value
            .then_with(|| pa.name.cmp(&pb.name))
            .then_with(|| pa.id.cmp(&pb.id))
    });

    let mut entries: Vec<RankedEntry> = Vec::with_capacity(values.len());
    for (i, (player, value)) in values.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(prev) if prev.value == value => prev.rank,
            _ => i + 1,
        };
        entries.push(RankedEntry {
            rank,
            player,
            value,
        });
    }
    entries
}
