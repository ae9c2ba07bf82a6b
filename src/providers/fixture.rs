//! In-memory provider backed by a JSON fixture.
//!
//! Serves teams, rosters, name lookups and stat lines from data loaded once
//! at construction. Used by the `statline` CLI and handy for wiring tests
//! against realistic data without a network.
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "teams":   [{ "id": "DAL", "name": "Dallas Cowboys", "abbreviation": "DAL", "sport": "NFL" }],
//!   "players": [{ "id": "4361", "name": "Micah Parsons", "position": "LB", "team_id": "DAL", "sport": "NFL" }],
//!   "stats":   [{ "sport": "NFL", "player_id": "4361", "season": "2024", "values": { "sacks": 12.5 } }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{RosterProvider, StatsProvider};
use crate::Result;
use crate::cache::{normalize_name, normalize_sport};
use crate::types::{PlayerRecord, Roster, StatLine, Team};

/// One player's stats for one season, as stored in a fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureStats {
    pub sport: String,
    pub player_id: String,
    pub season: String,
    pub values: StatLine,
}

/// Deserialized fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub stats: Vec<FixtureStats>,
}

/// Provider answering every collaborator call from memory.
#[derive(Default)]
pub struct StaticProvider {
    teams: Vec<Team>,
    players: Vec<PlayerRecord>,
    stats: HashMap<(String, String, String), StatLine>,
    team_list_calls: AtomicU64,
    roster_calls: AtomicU64,
    name_calls: AtomicU64,
    stats_calls: AtomicU64,
}

impl StaticProvider {
    pub fn new(fixture: Fixture) -> Self {
        let stats = fixture
            .stats
            .into_iter()
            .map(|s| {
                (
                    (normalize_sport(&s.sport), s.player_id, s.season),
                    s.values,
                )
            })
            .collect();
        Self {
            teams: fixture.teams,
            players: fixture.players,
            stats,
            ..Self::default()
        }
    }

    /// Parse a fixture from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a fixture file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Add a team and return self.
    pub fn with_team(mut self, team: Team) -> Self {
        self.teams.push(team);
        self
    }

    /// Add a player and return self.
    pub fn with_player(mut self, player: PlayerRecord) -> Self {
        self.players.push(player);
        self
    }

    /// Add a season stat line and return self.
    pub fn with_stats(mut self, sport: &str, player_id: &str, season: &str, values: StatLine) -> Self {
        self.stats.insert(
            (normalize_sport(sport), player_id.to_string(), season.to_string()),
            values,
        );
        self
    }

    /// Number of upstream-style calls served, per operation.
    pub fn calls(&self, operation: &str) -> u64 {
        let counter = match operation {
            "fetch_team_list" => &self.team_list_calls,
            "fetch_team_roster" => &self.roster_calls,
            "fetch_player_by_name" => &self.name_calls,
            "fetch_player_stats" => &self.stats_calls,
            _ => return 0,
        };
        counter.load(Ordering::Relaxed)
    }

    fn same_sport(a: &str, b: &str) -> bool {
        normalize_sport(a) == normalize_sport(b)
    }
}

#[async_trait]
impl RosterProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_team_list(&self, sport: &str) -> Result<Vec<Team>> {
        self.team_list_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .teams
            .iter()
            .filter(|t| Self::same_sport(&t.sport, sport))
            .cloned()
            .collect())
    }

    async fn fetch_team_roster(&self, sport: &str, team_id: &str) -> Result<Roster> {
        self.roster_calls.fetch_add(1, Ordering::Relaxed);
        let players = self
            .players
            .iter()
            .filter(|p| Self::same_sport(&p.sport, sport) && p.team_id == team_id)
            .cloned()
            .collect();
        Ok(Roster::new(team_id, players))
    }

    async fn fetch_player_by_name(&self, sport: &str, name: &str) -> Result<Option<PlayerRecord>> {
        self.name_calls.fetch_add(1, Ordering::Relaxed);
        let wanted = normalize_name(name);
        Ok(self
            .players
            .iter()
            .find(|p| Self::same_sport(&p.sport, sport) && normalize_name(&p.name) == wanted)
            .cloned())
    }
}

#[async_trait]
impl StatsProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_player_stats(
        &self,
        sport: &str,
        player_id: &str,
        season: &str,
        metrics: &[String],
    ) -> Result<StatLine> {
        self.stats_calls.fetch_add(1, Ordering::Relaxed);
        let key = (normalize_sport(sport), player_id.to_string(), season.to_string());
        let line = self.stats.get(&key).cloned().unwrap_or_default();
        if metrics.is_empty() {
            Ok(line)
        } else {
            Ok(line.select(metrics))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "teams": [
            { "id": "DAL", "name": "Dallas Cowboys", "abbreviation": "DAL", "sport": "NFL" },
            { "id": "LAL", "name": "Los Angeles Lakers", "abbreviation": "LAL", "sport": "NBA" }
        ],
        "players": [
            { "id": "1", "name": "Micah Parsons", "position": "LB", "team_id": "DAL", "sport": "NFL" }
        ],
        "stats": [
            { "sport": "nfl", "player_id": "1", "season": "2024", "values": { "sacks": 12.5, "tackles": 43 } }
        ]
    }"#;

    #[tokio::test]
    async fn serves_fixture_data() {
        let provider = StaticProvider::from_json(FIXTURE).unwrap();

        let teams = RosterProvider::fetch_team_list(&provider, "NFL").await.unwrap();
        assert_eq!(teams.len(), 1);

        let roster = provider.fetch_team_roster("NFL", "DAL").await.unwrap();
        assert_eq!(roster.players.len(), 1);

        let found = provider
            .fetch_player_by_name("nfl", "micah parsons")
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some("1".to_string()));

        let stats = provider
            .fetch_player_stats("NFL", "1", "2024", &["sacks".to_string()])
            .await
            .unwrap();
        assert_eq!(stats.get("sacks"), Some(12.5));
        assert_eq!(stats.get("tackles"), None);

        assert_eq!(provider.calls("fetch_player_stats"), 1);
    }

    #[tokio::test]
    async fn missing_stats_are_empty() {
        let provider = StaticProvider::from_json(FIXTURE).unwrap();
        let stats = provider
            .fetch_player_stats("NFL", "1", "1999", &[])
            .await
            .unwrap();
        assert!(stats.is_empty());
    }
}
