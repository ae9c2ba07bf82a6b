//! Typed cache keys and namespace TTL policy.
//!
//! Every key is built through a [`CacheKey`] constructor, which normalizes
//! its variable inputs (sport code, free-text names, metric lists) before
//! rendering. Two logically identical requests therefore always render to
//! the same string, whatever casing or metric order the caller used.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Placeholder rendered for an empty metric list (all metrics).
const ALL_METRICS: &str = "all";

/// Logical partition of the shared cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    PlayerIdentity,
    PlayerStats,
    TeamRoster,
    TeamList,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::PlayerIdentity,
        Namespace::PlayerStats,
        Namespace::TeamRoster,
        Namespace::TeamList,
    ];

    /// Label used in metrics and stats output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::PlayerIdentity => "player_identity",
            Namespace::PlayerStats => "player_stats",
            Namespace::TeamRoster => "team_roster",
            Namespace::TeamList => "team_list",
        }
    }

    /// Segment that follows the sport in a rendered key.
    fn segment(&self) -> &'static str {
        match self {
            Namespace::PlayerIdentity => "player",
            Namespace::PlayerStats => "stats",
            Namespace::TeamRoster => "roster",
            Namespace::TeamList => "teams",
        }
    }

    /// Recover the namespace from a rendered key.
    ///
    /// Sport codes never contain `:`, so the second segment is always the
    /// namespace marker. Returns `None` for keys not built by [`CacheKey`].
    pub fn of_key(key: &str) -> Option<Namespace> {
        let mut parts = key.splitn(3, ':');
        let _sport = parts.next()?;
        let segment = parts.next()?;
        Namespace::ALL.into_iter().find(|ns| ns.segment() == segment)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-namespace time-to-live.
///
/// Fixed for the lifetime of a cache; entries never carry their own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Player identity lookups. Default: 24 hours.
    pub player_identity: Duration,
    /// Player stat lines. Default: 1 hour.
    pub player_stats: Duration,
    /// Team rosters. Default: 6 hours.
    pub team_roster: Duration,
    /// League team lists. Default: 24 hours.
    pub team_list: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            player_identity: Duration::from_secs(24 * 3600),
            player_stats: Duration::from_secs(3600),
            team_roster: Duration::from_secs(6 * 3600),
            team_list: Duration::from_secs(24 * 3600),
        }
    }
}

impl TtlPolicy {
    pub fn ttl(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::PlayerIdentity => self.player_identity,
            Namespace::PlayerStats => self.player_stats,
            Namespace::TeamRoster => self.team_roster,
            Namespace::TeamList => self.team_list,
        }
    }
}

/// Normalize a free-text name: trim, collapse whitespace, lower-case.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a sport code: trim, upper-case, strip the key separator.
pub fn normalize_sport(sport: &str) -> String {
    sport.trim().replace(':', "").to_uppercase()
}

/// Composite key `(sport, namespace, fields...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    PlayerIdentity {
        sport: String,
        name: String,
    },
    PlayerStats {
        sport: String,
        player_id: String,
        season: String,
        metrics: Vec<String>,
    },
    TeamRoster {
        sport: String,
        team_id: String,
    },
    TeamList {
        sport: String,
    },
}

impl CacheKey {
    /// Identity key; the name is matched case-insensitively.
    pub fn player(sport: &str, name: &str) -> Self {
        CacheKey::PlayerIdentity {
            sport: normalize_sport(sport),
            name: normalize_name(name),
        }
    }

    /// Stats key; metric order and duplicates do not affect the key.
    pub fn stats<S: AsRef<str>>(sport: &str, player_id: &str, season: &str, metrics: &[S]) -> Self {
        let mut metrics: Vec<String> = metrics
            .iter()
            .map(|m| crate::types::canonical_metric(m.as_ref()))
            .filter(|m| !m.is_empty())
            .collect();
        metrics.sort();
        metrics.dedup();
        CacheKey::PlayerStats {
            sport: normalize_sport(sport),
            player_id: player_id.trim().to_string(),
            season: season.trim().to_string(),
            metrics,
        }
    }

    pub fn roster(sport: &str, team_id: &str) -> Self {
        CacheKey::TeamRoster {
            sport: normalize_sport(sport),
            team_id: team_id.trim().to_string(),
        }
    }

    pub fn team_list(sport: &str) -> Self {
        CacheKey::TeamList {
            sport: normalize_sport(sport),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            CacheKey::PlayerIdentity { .. } => Namespace::PlayerIdentity,
            CacheKey::PlayerStats { .. } => Namespace::PlayerStats,
            CacheKey::TeamRoster { .. } => Namespace::TeamRoster,
            CacheKey::TeamList { .. } => Namespace::TeamList,
        }
    }

    /// Render to the store's opaque string form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segment = self.namespace().segment();
        match self {
            CacheKey::PlayerIdentity { sport, name } => write!(f, "{sport}:{segment}:{name}"),
            CacheKey::PlayerStats {
                sport,
                player_id,
                season,
                metrics,
            } => {
                let metrics = if metrics.is_empty() {
                    ALL_METRICS.to_string()
                } else {
                    metrics.join(",")
                };
                write!(f, "{sport}:{segment}:{player_id}:{season}:{metrics}")
            }
            CacheKey::TeamRoster { sport, team_id } => write!(f, "{sport}:{segment}:{team_id}"),
            CacheKey::TeamList { sport } => write!(f, "{sport}:{segment}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_key_ignores_metric_order() {
        let k1 = CacheKey::stats("NFL", "123", "2024", &["b", "a"]);
        let k2 = CacheKey::stats("NFL", "123", "2024", &["a", "b"]);
        assert_eq!(k1, k2);
        assert_eq!(k1.render(), k2.render());
    }

    #[test]
    fn stats_key_ignores_duplicates_and_case() {
        let k1 = CacheKey::stats("nfl", "123", "2024", &["Sacks", "tackles", "sacks"]);
        let k2 = CacheKey::stats("NFL", "123", "2024", &["tackles", "sacks"]);
        assert_eq!(k1.render(), k2.render());
    }

    #[test]
    fn empty_metrics_render_as_all() {
        let key = CacheKey::stats::<&str>("NFL", "123", "2024", &[]);
        assert_eq!(key.render(), "NFL:stats:123:2024:all");
    }

    #[test]
    fn player_key_is_case_insensitive() {
        let k1 = CacheKey::player("NFL", "Micah Parsons");
        let k2 = CacheKey::player("nfl", "  micah   PARSONS ");
        assert_eq!(k1.render(), k2.render());
        assert_eq!(k1.render(), "NFL:player:micah parsons");
    }

    #[test]
    fn namespace_recovered_from_rendered_key() {
        let keys = [
            CacheKey::player("NFL", "Josh Allen"),
            CacheKey::stats("NFL", "1", "2024", &["sacks"]),
            CacheKey::roster("NFL", "DAL"),
            CacheKey::team_list("NFL"),
        ];
        for key in keys {
            assert_eq!(Namespace::of_key(&key.render()), Some(key.namespace()));
        }
    }

    #[test]
    fn player_names_containing_namespace_words_stay_identity() {
        // The name segment comes after the marker, so it cannot be confused
        // with the namespace marker itself.
        let key = CacheKey::player("NFL", "stats");
        assert_eq!(Namespace::of_key(&key.render()), Some(Namespace::PlayerIdentity));
    }

    #[test]
    fn unknown_key_shape() {
        assert_eq!(Namespace::of_key("garbage"), None);
        assert_eq!(Namespace::of_key("NFL:bogus:1"), None);
    }

    #[test]
    fn default_ttls() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.ttl(Namespace::PlayerIdentity), Duration::from_secs(86_400));
        assert_eq!(policy.ttl(Namespace::TeamRoster), Duration::from_secs(21_600));
        assert_eq!(policy.ttl(Namespace::PlayerStats), Duration::from_secs(3_600));
        assert_eq!(policy.ttl(Namespace::TeamList), Duration::from_secs(86_400));
    }
}
