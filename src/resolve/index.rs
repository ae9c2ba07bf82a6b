//! Per-sport index of known players.
//!
//! Built from the league's team list and every team's roster, each read
//! through the domain cache first. Entries carry the name variations the
//! exact-match pass compares against, computed once per build.
//!
//! A build whose team list cannot be fetched is not stored. A build that
//! skipped failing rosters is stored but counts as stale, so the next call
//! retries the missing teams while the rest come from the cache.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::{StreamExt, stream};
use tokio::time::Instant;
use tracing::{info, warn};

use super::hints::{initial_forms, name_variations};
use crate::Result;
use crate::cache::{DomainCache, normalize_sport};
use crate::providers::{RosterProvider, bounded};
use crate::types::{PlayerRecord, Roster, Team};

/// One indexed player.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub record: Arc<PlayerRecord>,
    /// Normalized spellings of the player's name, canonical form first.
    pub names: Vec<String>,
    /// Abbreviated spellings ("j. allen"). Matched exactly, never scored.
    pub initials: Vec<String>,
}

impl IndexEntry {
    pub fn new(record: Arc<PlayerRecord>) -> Self {
        let names = name_variations(&record.name);
        let initials = initial_forms(&record.name);
        Self {
            record,
            names,
            initials,
        }
    }

    /// Canonical normalized name.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether any of `spellings` is one of this player's names.
    pub fn answers_to(&self, spellings: &[String]) -> bool {
        self.names
            .iter()
            .chain(&self.initials)
            .any(|n| spellings.contains(n))
    }
}

#[derive(Clone)]
struct IndexedSport {
    entries: Arc<Vec<IndexEntry>>,
    built_at: Instant,
    /// False when some rosters were skipped.
    complete: bool,
}

/// Knobs for building an index.
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Rebuild when the current index is older than this.
    pub max_age: Duration,
    /// Bound on each upstream call.
    pub fetch_timeout: Duration,
    /// Roster fetches allowed in flight at once.
    pub max_concurrent_fetches: usize,
}

/// Player index shared by the resolver and the aggregator.
///
/// Builds may race; the last completed build wins.
#[derive(Default)]
pub struct PlayerIndex {
    sports: RwLock<HashMap<String, IndexedSport>>,
}

impl PlayerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for `sport`, fetching teams and rosters when the index is
    /// missing, incomplete or older than `options.max_age`.
    ///
    /// Fails with the upstream error when the team list cannot be obtained;
    /// nothing is stored in that case.
    pub async fn ensure(
        &self,
        sport: &str,
        cache: &DomainCache,
        provider: &dyn RosterProvider,
        options: &IndexOptions,
    ) -> Result<Arc<Vec<IndexEntry>>> {
        let sport = normalize_sport(sport);
        if let Some(entries) = self.fresh(&sport, options.max_age) {
            return Ok(entries);
        }

        let start = Instant::now();
        let loaded = load_players(&sport, cache, provider, options).await?;
        let entries: Vec<IndexEntry> = loaded.players.into_iter().map(IndexEntry::new).collect();
        let complete = loaded.skipped_rosters == 0;
        if complete {
            info!(
                sport = %sport,
                players = entries.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "built player index"
            );
        } else {
            warn!(
                sport = %sport,
                players = entries.len(),
                skipped_rosters = loaded.skipped_rosters,
                "built partial player index; missing rosters retried on next use"
            );
        }
        Ok(self.replace(&sport, entries, complete))
    }

    /// Current entries for `sport` regardless of age.
    pub fn entries(&self, sport: &str) -> Option<Arc<Vec<IndexEntry>>> {
        let sports = self.sports.read().unwrap_or_else(|e| e.into_inner());
        sports
            .get(&normalize_sport(sport))
            .map(|s| Arc::clone(&s.entries))
    }

    /// Whether the last stored build of `sport` had every roster.
    pub fn is_complete(&self, sport: &str) -> bool {
        let sports = self.sports.read().unwrap_or_else(|e| e.into_inner());
        sports
            .get(&normalize_sport(sport))
            .is_some_and(|s| s.complete)
    }

    /// Add a player learned outside a build. Ignored when the id is
    /// already indexed or the sport has not been built yet.
    pub fn extend(&self, sport: &str, record: Arc<PlayerRecord>) {
        let mut sports = self.sports.write().unwrap_or_else(|e| e.into_inner());
        let Some(indexed) = sports.get_mut(&normalize_sport(sport)) else {
            return;
        };
        if indexed.entries.iter().any(|e| e.record.id == record.id) {
            return;
        }
        let mut entries = indexed.entries.as_ref().clone();
        entries.push(IndexEntry::new(record));
        indexed.entries = Arc::new(entries);
    }

    /// Forget every sport.
    pub fn clear(&self) {
        self.sports
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn fresh(&self, sport: &str, max_age: Duration) -> Option<Arc<Vec<IndexEntry>>> {
        let sports = self.sports.read().unwrap_or_else(|e| e.into_inner());
        sports
            .get(sport)
            .filter(|s| s.complete && s.built_at.elapsed() <= max_age)
            .map(|s| Arc::clone(&s.entries))
    }

    fn replace(&self, sport: &str, entries: Vec<IndexEntry>, complete: bool) -> Arc<Vec<IndexEntry>> {
        let entries = Arc::new(entries);
        self.sports
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                sport.to_string(),
                IndexedSport {
                    entries: Arc::clone(&entries),
                    built_at: Instant::now(),
                    complete,
                },
            );
        entries
    }
}

struct LoadedPlayers {
    players: Vec<Arc<PlayerRecord>>,
    skipped_rosters: usize,
}

/// Every player on every roster of `sport`, de-duplicated by id.
///
/// A failed team list is an error; a failed roster is skipped and counted.
async fn load_players(
    sport: &str,
    cache: &DomainCache,
    provider: &dyn RosterProvider,
    options: &IndexOptions,
) -> Result<LoadedPlayers> {
    let teams = team_list(sport, cache, provider, options.fetch_timeout).await?;

    let rosters: Vec<Option<Roster>> = stream::iter(teams.iter())
        .map(|team| roster(sport, team, cache, provider, options.fetch_timeout))
        .buffered(options.max_concurrent_fetches.max(1))
        .collect()
        .await;

    let skipped_rosters = rosters.iter().filter(|r| r.is_none()).count();
    let mut seen = HashSet::new();
    let players = rosters
        .into_iter()
        .flatten()
        .flat_map(|r| r.players)
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    Ok(LoadedPlayers {
        players,
        skipped_rosters,
    })
}

async fn team_list(
    sport: &str,
    cache: &DomainCache,
    provider: &dyn RosterProvider,
    timeout: Duration,
) -> Result<Arc<Vec<Team>>> {
    if let Some(teams) = cache.get_team_list(sport) {
        return Ok(teams);
    }
    match bounded("fetch_team_list", timeout, provider.fetch_team_list(sport)).await {
        Ok(teams) => {
            cache.set_team_list(sport, teams.clone());
            Ok(Arc::new(teams))
        }
        Err(e) => {
            warn!(sport, error = %e, "team list unavailable; player index not built");
            Err(e)
        }
    }
}

async fn roster(
    sport: &str,
    team: &Team,
    cache: &DomainCache,
    provider: &dyn RosterProvider,
    timeout: Duration,
) -> Option<Roster> {
    if let Some(roster) = cache.get_roster(sport, &team.id) {
        return Some(roster);
    }
    match bounded(
        "fetch_team_roster",
        timeout,
        provider.fetch_team_roster(sport, &team.id),
    )
    .await
    {
        Ok(roster) => {
            cache.set_roster(sport, &team.id, roster.clone());
            Some(roster)
        }
        Err(e) => {
            warn!(sport, team = %team.id, error = %e, "skipping roster");
            None
        }
    }
}
