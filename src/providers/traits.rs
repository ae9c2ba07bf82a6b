//! Collaborator traits for upstream sports data.
//!
//! The core never talks to a network itself. Upstream clients (REST APIs,
//! a relational store, fixtures) implement these capability traits and are
//! injected into the engine:
//!
//! - [`RosterProvider`]: teams, rosters, and direct player lookup by name
//! - [`StatsProvider`]: per-player season stat lines
//!
//! Implementations may fail or rate-limit. Return
//! [`RateLimited`](crate::StatlineError::RateLimited) or
//! [`Unavailable`](crate::StatlineError::Unavailable) for conditions worth
//! retrying; other errors are treated as permanent.

use async_trait::async_trait;

use crate::Result;
use crate::types::{PlayerRecord, Roster, StatLine, Team};

// ============================================================================
// Roster Provider
// ============================================================================

/// Provider for league structure and player identity.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// All teams in the sport's league.
    async fn fetch_team_list(&self, sport: &str) -> Result<Vec<Team>>;

    /// Current roster of one team.
    async fn fetch_team_roster(&self, sport: &str, team_id: &str) -> Result<Roster>;

    /// Direct lookup by name, used when the roster index has no match.
    ///
    /// Returns `Ok(None)` when the provider knows of no such player.
    async fn fetch_player_by_name(&self, sport: &str, name: &str) -> Result<Option<PlayerRecord>>;
}

// ============================================================================
// Stats Provider
// ============================================================================

/// Provider for player statistics.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Season stats for one player.
    ///
    /// `metrics` is a hint: providers may return more metrics than asked
    /// for, and an empty slice means "all available".
    async fn fetch_player_stats(
        &self,
        sport: &str,
        player_id: &str,
        season: &str,
        metrics: &[String],
    ) -> Result<StatLine>;
}
