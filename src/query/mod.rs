//! Query classification.
//!
//! [`classify`] turns a question and the entities already extracted from it
//! into a [`QueryPlan`]: which [`QueryType`] it is, what shape the answer
//! takes, and which steps and data sources answering it needs. Pure and
//! synchronous; no I/O.
//!
//! Classification is a precedence table, first match wins:
//!
//! | # | condition                                   | type                 |
//! |---|---------------------------------------------|----------------------|
//! | 1 | two or more players and a comparison marker | `PlayerComparison`   |
//! | 2 | no player, a ranking marker and a metric    | `LeagueLeaders`      |
//! | 3 | one player and several metrics              | `MultiStatPlayer`    |
//! | 4 | one player and one metric                   | `SinglePlayerStat`   |
//! | 5 | a position filter and no player             | `PositionFiltered`   |
//! | 6 | a threshold phrase                          | `Threshold`          |
//! | 7 | two or more teams and no player             | `TeamComparison`     |
//!
//! After the table, two or more players fall back to `PlayerComparison` and
//! a lone player with no metric to `SinglePlayerStat`. Anything else is
//! [`StatlineError::Unclassifiable`].

pub mod markers;

pub use markers::{Comparator, Markers, SortOrder, Threshold};

use serde::{Deserialize, Serialize};

use crate::types::canonical_metric;
use crate::{Result, StatlineError};

/// Canonical query types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    SinglePlayerStat,
    MultiStatPlayer,
    PlayerComparison,
    LeagueLeaders,
    TeamComparison,
    PositionFiltered,
    Threshold,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::SinglePlayerStat => "single_player_stat",
            QueryType::MultiStatPlayer => "multi_stat_player",
            QueryType::PlayerComparison => "player_comparison",
            QueryType::LeagueLeaders => "league_leaders",
            QueryType::TeamComparison => "team_comparison",
            QueryType::PositionFiltered => "position_filtered",
            QueryType::Threshold => "threshold",
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            QueryType::SinglePlayerStat => ResponseShape::Simple,
            QueryType::MultiStatPlayer => ResponseShape::Detailed,
            QueryType::PlayerComparison | QueryType::TeamComparison => {
                ResponseShape::ComparisonTable
            }
            QueryType::LeagueLeaders | QueryType::PositionFiltered | QueryType::Threshold => {
                ResponseShape::Ranking
            }
        }
    }

    /// Whether answering needs a ranking over many players.
    pub fn is_ranking(&self) -> bool {
        self.response_shape() == ResponseShape::Ranking
    }

    pub fn data_sources(&self) -> Vec<DataSource> {
        match self {
            QueryType::SinglePlayerStat | QueryType::MultiStatPlayer => {
                vec![DataSource::PlayerStats]
            }
            QueryType::PlayerComparison => {
                vec![DataSource::PlayerStats, DataSource::MultiplePlayerStats]
            }
            QueryType::TeamComparison => vec![DataSource::TeamStats, DataSource::MultipleTeamStats],
            QueryType::LeagueLeaders | QueryType::Threshold => {
                vec![DataSource::LeagueStats, DataSource::AllPlayersStats]
            }
            QueryType::PositionFiltered => {
                vec![DataSource::LeagueStats, DataSource::PlayersByPosition]
            }
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the answer should be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    Simple,
    Detailed,
    ComparisonTable,
    Ranking,
}

/// One step of answering a query, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    ResolvePlayer,
    ResolveAllPlayers,
    ResolveTeams,
    FetchPlayerStats,
    FetchAllPlayerStats,
    FetchTeamStats,
    FetchLeagueStats,
    ExtractMetrics,
    CompareMetrics,
    FilterByPosition,
    RankByMetric,
    FilterByThreshold,
}

/// Data a query draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    PlayerStats,
    MultiplePlayerStats,
    TeamStats,
    MultipleTeamStats,
    LeagueStats,
    AllPlayersStats,
    PlayersByPosition,
}

/// Entities already extracted from a question.
///
/// Marker flags and filters set here are combined with what the question
/// text itself reveals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryEntities {
    pub players: Vec<String>,
    pub teams: Vec<String>,
    pub metrics: Vec<String>,
    pub positions: Vec<String>,
    pub season: Option<String>,
    pub has_comparison_marker: bool,
    pub has_ranking_marker: bool,
    /// Overrides the direction read from the question text.
    pub order: Option<SortOrder>,
    pub threshold: Option<Threshold>,
    pub limit: Option<usize>,
}

impl QueryEntities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(mut self, name: impl Into<String>) -> Self {
        self.players.push(name.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.teams.push(team.into());
        self
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metrics.push(metric.into());
        self
    }

    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.positions.push(position.into());
        self
    }

    pub fn season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn comparison(mut self) -> Self {
        self.has_comparison_marker = true;
        self
    }

    pub fn ranking(mut self) -> Self {
        self.has_ranking_marker = true;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
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
}

/// Filters narrowing a ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    /// Position abbreviations, upper-cased.
    pub positions: Vec<String>,
    pub threshold: Option<Threshold>,
    pub season: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: SortOrder,
}

/// Execution plan for one question. Stateless and disposable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub query_type: QueryType,
    pub response_shape: ResponseShape,
    pub processing_steps: Vec<ProcessingStep>,
    pub data_sources: Vec<DataSource>,
    pub players: Vec<String>,
    pub teams: Vec<String>,
    /// Canonical metric names.
    pub metrics: Vec<String>,
    pub filters: QueryFilters,
}

/// Classify `question` given the entities extracted from it.
pub fn classify(question: &str, entities: &QueryEntities) -> Result<QueryPlan> {
    let found = markers::scan(question);

    let players: Vec<String> = entities
        .players
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let teams: Vec<String> = entities
        .teams
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let mut metrics: Vec<String> = Vec::new();
    for metric in entities.metrics.iter().map(|m| canonical_metric(m)) {
        if !metric.is_empty() && !metrics.contains(&metric) {
            metrics.push(metric);
        }
    }
    let mut positions: Vec<String> = Vec::new();
    for position in entities
        .positions
        .iter()
        .chain(&found.positions)
        .map(|p| p.trim().to_uppercase())
    {
        if !position.is_empty() && !positions.contains(&position) {
            positions.push(position);
        }
    }

    let comparison = entities.has_comparison_marker || found.comparison;
    let ranking = entities.has_ranking_marker || found.ranking;
    let threshold = entities.threshold.or(found.threshold);

    let query_type = match (players.len(), metrics.len()) {
        (n, _) if n >= 2 && comparison => QueryType::PlayerComparison,
        (0, m) if ranking && m > 0 => QueryType::LeagueLeaders,
        (1, m) if m > 1 => QueryType::MultiStatPlayer,
        (1, 1) => QueryType::SinglePlayerStat,
        (0, _) if !positions.is_empty() => QueryType::PositionFiltered,
        _ if threshold.is_some() => QueryType::Threshold,
        (0, _) if teams.len() >= 2 => QueryType::TeamComparison,
        (n, _) if n >= 2 => QueryType::PlayerComparison,
        (1, 0) => QueryType::SinglePlayerStat,
        _ => {
            return Err(StatlineError::Unclassifiable(question.trim().to_string()));
        }
    };

    let filters = QueryFilters {
        positions,
        threshold,
        season: entities.season.clone().or(found.season),
        limit: entities.limit.or(found.limit),
        order: entities.order.unwrap_or(found.order),
    };

    Ok(QueryPlan {
        query_type,
        response_shape: query_type.response_shape(),
        processing_steps: processing_steps(query_type, &filters),
        data_sources: query_type.data_sources(),
        players,
        teams,
        metrics,
        filters,
    })
}

fn processing_steps(query_type: QueryType, filters: &QueryFilters) -> Vec<ProcessingStep> {
    use ProcessingStep::*;

    match query_type {
        QueryType::SinglePlayerStat | QueryType::MultiStatPlayer => {
            vec![ResolvePlayer, FetchPlayerStats, ExtractMetrics]
        }
        QueryType::PlayerComparison => vec![
            ResolveAllPlayers,
            FetchAllPlayerStats,
            ExtractMetrics,
            CompareMetrics,
        ],
        QueryType::TeamComparison => vec![ResolveTeams, FetchTeamStats, CompareMetrics],
        QueryType::LeagueLeaders | QueryType::PositionFiltered | QueryType::Threshold => {
            let mut steps = vec![FetchLeagueStats];
            if !filters.positions.is_empty() {
                steps.push(FilterByPosition);
            }
            steps.push(RankByMetric);
            if filters.threshold.is_some() {
                steps.push(FilterByThreshold);
            }
            steps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_filters() {
        let plan = classify(
            "Which linebackers have 10+ sacks?",
            &QueryEntities::new().metric("sacks"),
        )
        .unwrap();
        assert_eq!(plan.query_type, QueryType::PositionFiltered);
        assert_eq!(
            plan.processing_steps,
            vec![
                ProcessingStep::FetchLeagueStats,
                ProcessingStep::FilterByPosition,
                ProcessingStep::RankByMetric,
                ProcessingStep::FilterByThreshold,
            ]
        );
        assert_eq!(plan.data_sources, vec![DataSource::LeagueStats, DataSource::PlayersByPosition]);
    }

    #[test]
    fn metrics_are_canonical_and_deduplicated() {
        let plan = classify(
            "Micah Parsons sacks",
            &QueryEntities::new()
                .player("Micah Parsons")
                .metric("Sacks")
                .metric("sacks"),
        )
        .unwrap();
        assert_eq!(plan.query_type, QueryType::SinglePlayerStat);
        assert_eq!(plan.metrics, vec!["sacks"]);
        assert_eq!(plan.response_shape, ResponseShape::Simple);
    }

    #[test]
    fn empty_question_is_unclassifiable() {
        let err = classify("hello there", &QueryEntities::new()).unwrap_err();
        assert!(matches!(err, StatlineError::Unclassifiable(_)));
    }
}
