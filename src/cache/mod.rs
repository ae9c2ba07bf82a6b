//! Caching subsystem.
//!
//! [`DomainCache`] is the single shared cache of an engine. It sits on one
//! [`TtlStore`] and exposes an accessor pair per [`Namespace`]:
//!
//! - player identity: `sport + name` to a resolved [`PlayerRecord`]
//! - player stats: `sport + player + season + metrics` to a [`StatLine`]
//! - team roster: `sport + team` to a [`Roster`]
//! - team list: `sport` to the league's [`Team`]s
//!
//! Each namespace has its own TTL ([`TtlPolicy`]) and key shape
//! ([`CacheKey`]). All operations are in-memory and never block on I/O, so
//! the cache is shared by reference across every concurrent caller.

pub mod key;
pub mod store;

pub use key::{CacheKey, Namespace, TtlPolicy, normalize_name, normalize_sport};
pub use store::{CacheEntry, TtlStore};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, info};

use crate::telemetry;
use crate::types::{PlayerRecord, Roster, StatLine, Team};

/// Estimated upstream calls a cold player lookup costs (one roster fetch
/// per team). Credited to `api_calls_saved` on every identity hit.
pub const PLAYER_LOOKUP_CALLS_SAVED: u64 = 16;

/// Configuration for the domain cache.
///
/// ```rust
/// # use statline::cache::{DomainCacheConfig, TtlPolicy};
/// # use std::time::Duration;
/// let config = DomainCacheConfig::new()
///     .max_entries(50_000)
///     .ttl(TtlPolicy {
///         player_stats: Duration::from_secs(600),
///         ..TtlPolicy::default()
///     });
/// ```
#[derive(Debug, Clone)]
pub struct DomainCacheConfig {
    /// Maximum number of cached entries across all namespaces. Default: 10,000.
    pub max_entries: u64,
    /// Namespace TTLs.
    pub ttl: TtlPolicy,
}

impl Default for DomainCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: store::DEFAULT_MAX_ENTRIES,
            ttl: TtlPolicy::default(),
        }
    }
}

impl DomainCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the namespace TTLs.
    pub fn ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Cached value, one variant per namespace.
#[derive(Clone, Debug)]
pub(crate) enum CachedValue {
    Player(Arc<PlayerRecord>),
    Stats(StatLine),
    Roster(Roster),
    TeamList(Arc<Vec<Team>>),
}

/// Point-in-time view of cache performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub api_calls_saved: u64,
    /// `hits / (hits + misses) * 100`, rounded to one decimal; 0 when idle.
    pub hit_rate_percent: f64,
    /// Entries currently held per namespace (expired entries included
    /// until swept).
    pub counts_by_namespace: BTreeMap<Namespace, usize>,
}

/// Namespace-aware cache shared by every caller of an engine.
pub struct DomainCache {
    store: TtlStore<CachedValue>,
    ttl: TtlPolicy,
    api_calls_saved: AtomicU64,
}

impl DomainCache {
    /// Create a cache with default capacity and TTLs.
    pub fn new() -> Self {
        Self::with_config(&DomainCacheConfig::default())
    }

    pub fn with_config(config: &DomainCacheConfig) -> Self {
        Self {
            store: TtlStore::with_max_entries(config.max_entries),
            ttl: config.ttl,
            api_calls_saved: AtomicU64::new(0),
        }
    }

    /// The TTL policy this cache enforces.
    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    // ===== Player identity =====

    /// Look up a resolved player by name (case-insensitive).
    pub fn get_player(&self, sport: &str, name: &str) -> Option<Arc<PlayerRecord>> {
        match self.lookup(&CacheKey::player(sport, name)) {
            Some(CachedValue::Player(p)) => Some(p),
            _ => None,
        }
    }

    /// Cache a resolved player under its lower-cased name.
    pub fn set_player(&self, sport: &str, name: &str, record: Arc<PlayerRecord>) {
        self.insert(CacheKey::player(sport, name), CachedValue::Player(record));
    }

    // ===== Player stats =====

    /// Look up a player's stats; `metrics` order does not matter.
    pub fn get_stats<S: AsRef<str>>(
        &self,
        sport: &str,
        player_id: &str,
        season: &str,
        metrics: &[S],
    ) -> Option<StatLine> {
        match self.lookup(&CacheKey::stats(sport, player_id, season, metrics)) {
            Some(CachedValue::Stats(s)) => Some(s),
            _ => None,
        }
    }

    pub fn set_stats<S: AsRef<str>>(
        &self,
        sport: &str,
        player_id: &str,
        season: &str,
        metrics: &[S],
        stats: StatLine,
    ) {
        self.insert(
            CacheKey::stats(sport, player_id, season, metrics),
            CachedValue::Stats(stats),
        );
    }

    // ===== Team roster =====

    pub fn get_roster(&self, sport: &str, team_id: &str) -> Option<Roster> {
        match self.lookup(&CacheKey::roster(sport, team_id)) {
            Some(CachedValue::Roster(r)) => Some(r),
            _ => None,
        }
    }

    pub fn set_roster(&self, sport: &str, team_id: &str, roster: Roster) {
        self.insert(CacheKey::roster(sport, team_id), CachedValue::Roster(roster));
    }

    // ===== Team list =====

    pub fn get_team_list(&self, sport: &str) -> Option<Arc<Vec<Team>>> {
        match self.lookup(&CacheKey::team_list(sport)) {
            Some(CachedValue::TeamList(t)) => Some(t),
            _ => None,
        }
    }

    pub fn set_team_list(&self, sport: &str, teams: Vec<Team>) {
        self.insert(
            CacheKey::team_list(sport),
            CachedValue::TeamList(Arc::new(teams)),
        );
    }

    // ===== Maintenance =====

    /// Remove every entry whose namespace TTL has elapsed.
    ///
    /// The namespace is inferred from each key's shape. Returns the number
    /// of removed entries.
    pub fn clear_expired(&self) -> usize {
        let removed = self
            .store
            .sweep(tokio::time::Instant::now(), |key| {
                Namespace::of_key(key).map(|ns| self.ttl.ttl(ns))
            });
        for key in &removed {
            if let Some(ns) = Namespace::of_key(key) {
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "namespace" => ns.as_str())
                    .increment(1);
            }
        }
        if !removed.is_empty() {
            info!(removed = removed.len(), "removed expired cache entries");
        }
        removed.len()
    }

    /// Current hit/miss counters and per-namespace entry counts.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let hits = self.store.hits();
        let misses = self.store.misses();
        let total = hits + misses;
        let hit_rate_percent = if total > 0 {
            (hits as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        let mut counts_by_namespace: BTreeMap<Namespace, usize> =
            Namespace::ALL.into_iter().map(|ns| (ns, 0)).collect();
        for key in self.store.keys() {
            if let Some(ns) = Namespace::of_key(&key) {
                *counts_by_namespace.entry(ns).or_default() += 1;
            }
        }

        CacheStatsSnapshot {
            hits,
            misses,
            api_calls_saved: self.api_calls_saved.load(Ordering::Relaxed),
            hit_rate_percent,
            counts_by_namespace,
        }
    }

    /// Zero the hit, miss and saved-call counters.
    pub fn reset_stats(&self) {
        self.store.reset_counters();
        self.api_calls_saved.store(0, Ordering::Relaxed);
    }

    /// Drop every entry and reset statistics.
    pub fn clear_all(&self) {
        self.store.clear();
        self.reset_stats();
        info!("cleared all cache entries");
    }

    fn lookup(&self, key: &CacheKey) -> Option<CachedValue> {
        let ns = key.namespace();
        let rendered = key.render();
        match self.store.get(&rendered, self.ttl.ttl(ns)) {
            Some(value) => {
                let saved = match ns {
                    Namespace::PlayerIdentity => PLAYER_LOOKUP_CALLS_SAVED,
                    _ => 1,
                };
                self.api_calls_saved.fetch_add(saved, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "namespace" => ns.as_str())
                    .increment(1);
                metrics::counter!(telemetry::API_CALLS_SAVED_TOTAL, "namespace" => ns.as_str())
                    .increment(saved);
                debug!(key = %rendered, "cache hit");
                Some(value)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "namespace" => ns.as_str())
                    .increment(1);
                None
            }
        }
    }

    fn insert(&self, key: CacheKey, value: CachedValue) {
        let rendered = key.render();
        debug!(key = %rendered, "cache store");
        self.store.set(rendered, value);
    }
}

impl Default for DomainCache {
    fn default() -> Self {
        Self::new()
    }
}
