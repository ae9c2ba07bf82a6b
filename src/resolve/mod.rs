//! Identity resolution: free-text player names to [`PlayerRecord`]s.
//!
//! Resolution is cache-first and proceeds in passes, stopping at the first
//! that produces an answer:
//!
//! 1. the player-identity namespace of the [`DomainCache`]
//! 2. exact match against the sport's [`PlayerIndex`], with name variations
//! 3. deterministic ranking when several players share the name
//! 4. fuzzy scoring with the configured [`NameScorer`]
//! 5. the upstream `fetch_player_by_name` lookup
//!
//! "Not found" and "ambiguous" are statuses on [`ResolutionResult`], not
//! errors. Only an upstream failure after every local pass came up empty is
//! returned as `Err`.

pub mod hints;
pub mod index;
pub mod scorer;

pub use index::{IndexEntry, IndexOptions, PlayerIndex};
pub use scorer::{JaroWinklerScorer, LevenshteinScorer, NameScorer, ScorerKind, TokenJaccardScorer};

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;
use crate::cache::{DomainCache, normalize_name, normalize_sport};
use crate::providers::{RosterProvider, bounded};
use crate::telemetry;
use crate::types::PlayerRecord;
use hints::{positions_for_metrics, query_variations, team_matches};

/// Confidence given to a collision settled by context hints alone.
pub const CONTEXT_CONFIDENCE: f64 = 0.9;
/// Confidence given to a collision nothing in the context could settle.
pub const COLLISION_CONFIDENCE: f64 = 0.5;
/// Ambiguous results list at least this many alternatives when available.
pub const MIN_ALTERNATIVES: usize = 3;

/// Resolver tuning.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Fuzzy score at or above which the best match is accepted. Default: 0.85.
    pub auto_accept: f64,
    /// Fuzzy score below which a candidate is discarded. Default: 0.6.
    pub min_similarity: f64,
    /// Alternatives returned for an ambiguous fuzzy match. Default: 5.
    pub max_alternatives: usize,
    pub scorer: ScorerKind,
    /// Bound on each upstream call. Default: 10s.
    pub fetch_timeout: Duration,
    /// Roster fetches in flight while building the index. Default: 8.
    pub max_concurrent_fetches: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            auto_accept: 0.85,
            min_similarity: 0.6,
            max_alternatives: 5,
            scorer: ScorerKind::default(),
            fetch_timeout: Duration::from_secs(10),
            max_concurrent_fetches: 8,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_accept(mut self, threshold: f64) -> Self {
        self.auto_accept = threshold;
        self
    }

    pub fn min_similarity(mut self, floor: f64) -> Self {
        self.min_similarity = floor;
        self
    }

    pub fn max_alternatives(mut self, k: usize) -> Self {
        self.max_alternatives = k;
        self
    }

    pub fn scorer(mut self, scorer: ScorerKind) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n;
        self
    }
}

/// Hints from the surrounding question used to break name collisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveContext {
    /// Metrics the question asks about; they imply likely positions.
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metrics.push(metric.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.team.is_none() && self.position.is_none()
    }
}

/// Outcome class of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    Ambiguous,
    NotFound,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Resolved => "resolved",
            ResolutionStatus::Ambiguous => "ambiguous",
            ResolutionStatus::NotFound => "not_found",
        }
    }
}

/// A candidate player and how well its name matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub player: Arc<PlayerRecord>,
    /// Name similarity in `[0, 1]`; 1 for exact matches.
    pub score: f64,
}

/// Result of one resolution call. Built fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub query: String,
    pub status: ResolutionStatus,
    pub chosen: Option<Arc<PlayerRecord>>,
    pub confidence: f64,
    /// Other plausible players, best first. For a name collision this is
    /// every colliding player, the chosen one included.
    pub alternatives: Vec<Candidate>,
}

impl ResolutionResult {
    fn resolved(query: &str, player: Arc<PlayerRecord>, confidence: f64) -> Self {
        Self {
            query: query.to_string(),
            status: ResolutionStatus::Resolved,
            chosen: Some(player),
            confidence,
            alternatives: Vec::new(),
        }
    }

    fn not_found(query: &str) -> Self {
        Self {
            query: query.to_string(),
            status: ResolutionStatus::NotFound,
            chosen: None,
            confidence: 0.0,
            alternatives: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }
}

/// Resolves names against the shared cache, the player index and, as a
/// last resort, the roster provider.
pub struct Resolver {
    cache: Arc<DomainCache>,
    provider: Arc<dyn RosterProvider>,
    index: PlayerIndex,
    scorer: Arc<dyn NameScorer>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(
        cache: Arc<DomainCache>,
        provider: Arc<dyn RosterProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            index: PlayerIndex::new(),
            scorer: config.scorer.build(),
            config,
        }
    }

    /// Replace the configured scorer with a custom one.
    pub fn with_scorer(mut self, scorer: Arc<dyn NameScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Every indexed player of `sport`, building the index if needed.
    ///
    /// Fails when the sport's team list cannot be fetched.
    pub async fn players(&self, sport: &str) -> Result<Vec<Arc<PlayerRecord>>> {
        Ok(self
            .entries(sport)
            .await?
            .iter()
            .map(|e| Arc::clone(&e.record))
            .collect())
    }

    /// Drop the player index; the next call rebuilds it.
    pub fn clear_index(&self) {
        self.index.clear();
    }

    /// Resolve `name` without context hints.
    pub async fn resolve(&self, sport: &str, name: &str) -> Result<ResolutionResult> {
        self.resolve_with_context(sport, name, &ResolveContext::default())
            .await
    }

    /// Resolve `name`, using `context` to break name collisions.
    pub async fn resolve_with_context(
        &self,
        sport: &str,
        name: &str,
        context: &ResolveContext,
    ) -> Result<ResolutionResult> {
        let result = self.run(sport, name, context).await;
        if let Ok(ref r) = result {
            metrics::counter!(telemetry::RESOLUTIONS_TOTAL, "outcome" => r.status.as_str())
                .increment(1);
            debug!(
                sport,
                query = %r.query,
                status = r.status.as_str(),
                confidence = r.confidence,
                alternatives = r.alternatives.len(),
                "resolved player name"
            );
        }
        result
    }

    async fn run(
        &self,
        sport: &str,
        name: &str,
        context: &ResolveContext,
    ) -> Result<ResolutionResult> {
        let query = normalize_name(name);
        if query.is_empty() {
            return Ok(ResolutionResult::not_found(&query));
        }

        if let Some(player) = self.cache.get_player(sport, &query) {
            return Ok(ResolutionResult::resolved(&query, player, 1.0));
        }

        // without an index the upstream lookup is all that is left
        let entries = match self.entries(sport).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(sport, error = %e, "resolving without a player index");
                Arc::new(Vec::new())
            }
        };

        let variations = query_variations(&query);
        let exact: Vec<&IndexEntry> = entries
            .iter()
            .filter(|e| e.answers_to(&variations))
            .collect();

        match exact.as_slice() {
            [only] => {
                let player = Arc::clone(&only.record);
                self.cache.set_player(sport, &query, Arc::clone(&player));
                return Ok(ResolutionResult::resolved(&query, player, 1.0));
            }
            [_, _, ..] => return Ok(self.break_collision(sport, &query, &exact, context)),
            [] => {}
        }

        if let Some(result) = self.fuzzy(sport, &query, &entries) {
            return Ok(result);
        }

        self.fetch_upstream(sport, &query).await
    }

    /// Rank players sharing one name. Never cached: the choice may depend
    /// on the context.
    fn break_collision(
        &self,
        sport: &str,
        query: &str,
        exact: &[&IndexEntry],
        context: &ResolveContext,
    ) -> ResolutionResult {
        let implied = positions_for_metrics(sport, &context.metrics);
        let hints = |p: &PlayerRecord| -> (bool, bool) {
            let team = context
                .team
                .as_deref()
                .is_some_and(|t| team_matches(t, &p.team_id));
            let position = match context.position.as_deref() {
                Some(pos) => pos.trim().eq_ignore_ascii_case(&p.position),
                None => implied.iter().any(|i| i.eq_ignore_ascii_case(&p.position)),
            };
            (team, position)
        };

        let mut ranked: Vec<Arc<PlayerRecord>> =
            exact.iter().map(|e| Arc::clone(&e.record)).collect();
        ranked.sort_by(|a, b| {
            hints(b)
                .cmp(&hints(a))
                .then_with(|| b.active.cmp(&a.active))
                .then_with(|| b.last_season.cmp(&a.last_season))
                .then_with(|| a.team_id.cmp(&b.team_id))
                .then_with(|| a.id.cmp(&b.id))
        });

        let top = hints(&ranked[0]);
        let separated = ranked[1..].iter().all(|p| hints(p) < top);
        let (status, confidence) = if separated {
            (ResolutionStatus::Resolved, CONTEXT_CONFIDENCE)
        } else {
            (ResolutionStatus::Ambiguous, COLLISION_CONFIDENCE)
        };

        ResolutionResult {
            query: query.to_string(),
            status,
            chosen: Some(Arc::clone(&ranked[0])),
            confidence,
            alternatives: ranked
                .into_iter()
                .map(|player| Candidate { player, score: 1.0 })
                .collect(),
        }
    }

    /// Fuzzy pass. `None` when nothing clears the similarity floor.
    fn fuzzy(&self, sport: &str, query: &str, entries: &[IndexEntry]) -> Option<ResolutionResult> {
        let mut scored: Vec<Candidate> = entries
            .iter()
            .map(|e| Candidate {
                player: Arc::clone(&e.record),
                score: e
                    .names
                    .iter()
                    .map(|n| self.scorer.score(query, n))
                    .fold(0.0, f64::max),
            })
            .filter(|c| c.score >= self.config.min_similarity)
            .collect();
        if scored.is_empty() {
            return None;
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.player.name.cmp(&b.player.name))
                .then_with(|| a.player.id.cmp(&b.player.id))
        });

        let best = scored[0].score;
        let runner_up = scored.get(1).map(|c| c.score).unwrap_or(0.0);
        if best >= self.config.auto_accept && best > runner_up {
            let player = Arc::clone(&scored[0].player);
            // cached under the real name, so a repeated typo scores again
            // rather than coming back at full confidence
            let canonical = normalize_name(&player.name);
            let unique = entries
                .iter()
                .filter(|e| e.names.contains(&canonical))
                .count()
                == 1;
            if unique {
                self.cache.set_player(sport, &canonical, Arc::clone(&player));
            }
            return Some(ResolutionResult::resolved(query, player, best));
        }

        scored.truncate(self.config.max_alternatives.max(MIN_ALTERNATIVES));
        Some(ResolutionResult {
            query: query.to_string(),
            status: ResolutionStatus::Ambiguous,
            chosen: None,
            confidence: best,
            alternatives: scored,
        })
    }

    async fn fetch_upstream(&self, sport: &str, query: &str) -> Result<ResolutionResult> {
        let found = bounded(
            "fetch_player_by_name",
            self.config.fetch_timeout,
            self.provider.fetch_player_by_name(sport, query),
        )
        .await?;

        match found {
            Some(record) => {
                let player = Arc::new(record);
                self.index.extend(sport, Arc::clone(&player));
                self.cache.set_player(sport, query, Arc::clone(&player));
                Ok(ResolutionResult::resolved(query, player, 1.0))
            }
            None => Ok(ResolutionResult::not_found(query)),
        }
    }

    async fn entries(&self, sport: &str) -> Result<Arc<Vec<IndexEntry>>> {
        let options = IndexOptions {
            max_age: self.cache.ttl_policy().team_roster,
            fetch_timeout: self.config.fetch_timeout,
            max_concurrent_fetches: self.config.max_concurrent_fetches,
        };
        self.index
            .ensure(
                &normalize_sport(sport),
                &self.cache,
                self.provider.as_ref(),
                &options,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::StaticProvider;
    use crate::types::Team;

    fn resolver(provider: StaticProvider) -> Resolver {
        Resolver::new(
            Arc::new(DomainCache::new()),
            Arc::new(provider),
            ResolverConfig::default(),
        )
    }

    fn league() -> StaticProvider {
        StaticProvider::default()
            .with_team(Team::new("KC", "Kansas City Chiefs", "KC", "NFL"))
            .with_team(Team::new("NYJ", "New York Jets", "NYJ", "NFL"))
            .with_player(PlayerRecord::new("10", "Patrick Mahomes", "QB", "KC", "NFL"))
            .with_player(PlayerRecord::new("11", "Travis Kelce", "TE", "KC", "NFL"))
            .with_player(PlayerRecord::new("12", "Garrett Wilson", "WR", "NYJ", "NFL"))
    }

    #[tokio::test]
    async fn empty_name_is_not_found() {
        let result = resolver(league()).resolve("NFL", "   ").await.unwrap();
        assert_eq!(result.status, ResolutionStatus::NotFound);
        assert!(result.chosen.is_none());
    }

    #[tokio::test]
    async fn exact_match_resolves_and_caches() {
        let r = resolver(league());
        let result = r.resolve("NFL", "  PATRICK   mahomes ").await.unwrap();
        assert_eq!(result.status, ResolutionStatus::Resolved);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.chosen.as_ref().map(|p| p.id.as_str()), Some("10"));
        assert!(r.cache.get_player("NFL", "patrick mahomes").is_some());
    }

    #[tokio::test]
    async fn typo_is_auto_accepted() {
        let result = resolver(league())
            .resolve("NFL", "Patrick Mahommes")
            .await
            .unwrap();
        assert_eq!(result.status, ResolutionStatus::Resolved);
        assert!(result.confidence >= 0.85);
        assert!(result.confidence < 1.0);
        assert_eq!(result.chosen.map(|p| p.id.clone()), Some("10".to_string()));
    }

    #[tokio::test]
    async fn repeated_typo_keeps_its_confidence() {
        let r = resolver(league());
        let first = r.resolve("NFL", "Patrick Mahommes").await.unwrap();
        let second = r.resolve("NFL", "Patrick Mahommes").await.unwrap();
        assert_eq!(second.status, ResolutionStatus::Resolved);
        assert_eq!(second.confidence, first.confidence);
        assert!(second.confidence < 1.0);
        assert!(r.cache.get_player("NFL", "patrick mahommes").is_none());
        assert!(r.cache.get_player("NFL", "patrick mahomes").is_some());

        // the correct spelling is now a cache hit
        let exact = r.resolve("NFL", "patrick mahomes").await.unwrap();
        assert_eq!(exact.confidence, 1.0);
    }

    #[tokio::test]
    async fn first_initial_matches_exactly() {
        let r = resolver(league());
        let result = r.resolve("NFL", "T. Kelce").await.unwrap();
        assert_eq!(result.status, ResolutionStatus::Resolved);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.chosen.map(|p| p.id.clone()), Some("11".to_string()));
    }

    #[tokio::test]
    async fn full_name_does_not_match_other_initials() {
        let provider = league().with_player(PlayerRecord::new("13", "Pat Mahomes", "QB", "NYJ", "NFL"));
        let result = resolver(provider)
            .resolve("NFL", "Patrick Mahomes")
            .await
            .unwrap();
        assert_eq!(result.status, ResolutionStatus::Resolved);
        assert_eq!(result.chosen.map(|p| p.id.clone()), Some("10".to_string()));
    }

    #[tokio::test]
    async fn collision_is_broken_by_team_hint() {
        let provider = league()
            .with_player(PlayerRecord::new("20", "Josh Allen", "QB", "KC", "NFL"))
            .with_player(PlayerRecord::new("21", "Josh Allen", "LB", "NYJ", "NFL"));
        let r = resolver(provider);

        let context = ResolveContext::new().team("NYJ");
        let result = r
            .resolve_with_context("NFL", "Josh Allen", &context)
            .await
            .unwrap();
        assert_eq!(result.status, ResolutionStatus::Resolved);
        assert_eq!(result.confidence, CONTEXT_CONFIDENCE);
        assert_eq!(result.chosen.map(|p| p.id.clone()), Some("21".to_string()));
        assert_eq!(result.alternatives.len(), 2);
        // context-dependent choices stay out of the identity cache
        assert!(r.cache.get_player("NFL", "josh allen").is_none());
    }

    #[tokio::test]
    async fn collision_prefers_active_then_recent() {
        let provider = league()
            .with_player(
                PlayerRecord::new("30", "Chris Jones", "DT", "KC", "NFL")
                    .inactive()
                    .last_season(2019),
            )
            .with_player(PlayerRecord::new("31", "Chris Jones", "DT", "NYJ", "NFL").last_season(2023))
            .with_player(PlayerRecord::new("32", "Chris Jones", "DT", "NYJ", "NFL").last_season(2024));

        let result = resolver(provider).resolve("NFL", "chris jones").await.unwrap();
        assert_eq!(result.status, ResolutionStatus::Ambiguous);
        assert_eq!(result.confidence, COLLISION_CONFIDENCE);
        let order: Vec<&str> = result
            .alternatives
            .iter()
            .map(|c| c.player.id.as_str())
            .collect();
        assert_eq!(order, vec!["32", "31", "30"]);
        assert_eq!(result.chosen.map(|p| p.id.clone()), Some("32".to_string()));
    }

    #[tokio::test]
    async fn unknown_name_falls_back_to_upstream() {
        let r = resolver(league());
        let result = r.resolve("NFL", "Zzyzx Qqq").await.unwrap();
        assert_eq!(result.status, ResolutionStatus::NotFound);
        assert!(result.alternatives.is_empty());
    }
}
