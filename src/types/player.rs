//! Player, team and roster records

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A known player.
///
/// Shared as `Arc<PlayerRecord>` between the resolver's index and the
/// identity cache; neither owns the identity, both hold a view of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    /// Position abbreviation (e.g. `"QB"`, `"WR"`).
    pub position: String,
    pub team_id: String,
    pub sport: String,
    /// Whether the player is on an active roster.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Most recent season the player appeared in, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_season: Option<u16>,
}

fn default_active() -> bool {
    true
}

impl PlayerRecord {
    /// Create an active player record with no season information.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: impl Into<String>,
        team_id: impl Into<String>,
        sport: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: position.into(),
            team_id: team_id.into(),
            sport: sport.into(),
            active: true,
            last_season: None,
        }
    }

    /// Mark the player inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Set the most recent season the player appeared in.
    pub fn last_season(mut self, season: u16) -> Self {
        self.last_season = Some(season);
        self
    }
}

/// A franchise in a league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    pub sport: String,
}

impl Team {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        sport: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            abbreviation: abbreviation.into(),
            sport: sport.into(),
        }
    }
}

/// The players currently on one team.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Roster {
    pub team_id: String,
    pub players: Vec<Arc<PlayerRecord>>,
}

impl Roster {
    pub fn new(team_id: impl Into<String>, players: Vec<PlayerRecord>) -> Self {
        Self {
            team_id: team_id.into(),
            players: players.into_iter().map(Arc::new).collect(),
        }
    }
}
