//! Configuration loading.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. an explicit path (the CLI's `--config`)
//! 2. `~/.statline/config.toml` (user)
//! 3. `/etc/statline/config.toml` (system)
//! 4. built-in defaults
//!
//! Every field is optional; a missing field keeps its default.
//!
//! ```toml
//! [cache]
//! max_entries = 10000
//! player_stats_ttl_secs = 600
//!
//! [resolver]
//! auto_accept = 0.9
//! scorer = "levenshtein"
//!
//! [aggregation]
//! default_limit = 10
//! season = "2024"
//!
//! [upstream]
//! timeout_secs = 5
//! retry_attempts = 3
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::{AggregationConfig, DEFAULT_SEASON};
use crate::cache::{DomainCacheConfig, TtlPolicy};
use crate::providers::RetryConfig;
use crate::resolve::{ResolverConfig, ScorerKind};
use crate::{Result, StatlineError};

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub aggregation: AggregationSection,
    #[serde(default)]
    pub upstream: UpstreamSection,
}

/// Cache capacity and namespace TTLs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheSection {
    /// Maximum cached entries across namespaces (default: 10000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Player identity TTL in seconds (default: 86400).
    #[serde(default = "default_player_identity_ttl")]
    pub player_identity_ttl_secs: u64,
    /// Player stats TTL in seconds (default: 3600).
    #[serde(default = "default_player_stats_ttl")]
    pub player_stats_ttl_secs: u64,
    /// Team roster TTL in seconds (default: 21600).
    #[serde(default = "default_team_roster_ttl")]
    pub team_roster_ttl_secs: u64,
    /// Team list TTL in seconds (default: 86400).
    #[serde(default = "default_team_list_ttl")]
    pub team_list_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            player_identity_ttl_secs: default_player_identity_ttl(),
            player_stats_ttl_secs: default_player_stats_ttl(),
            team_roster_ttl_secs: default_team_roster_ttl(),
            team_list_ttl_secs: default_team_list_ttl(),
        }
    }
}

fn default_max_entries() -> u64 {
    crate::cache::store::DEFAULT_MAX_ENTRIES
}

fn default_player_identity_ttl() -> u64 {
    24 * 60 * 60
}

fn default_player_stats_ttl() -> u64 {
    60 * 60
}

fn default_team_roster_ttl() -> u64 {
    6 * 60 * 60
}

fn default_team_list_ttl() -> u64 {
    24 * 60 * 60
}

/// Name matching thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResolverSection {
    /// Fuzzy score accepted without asking (default: 0.85).
    #[serde(default = "default_auto_accept")]
    pub auto_accept: f64,
    /// Fuzzy score below which a candidate is dropped (default: 0.6).
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// Alternatives listed for an ambiguous name (default: 5).
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
    /// `jaro_winkler` (default), `levenshtein` or `token_jaccard`.
    #[serde(default)]
    pub scorer: ScorerKind,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            auto_accept: default_auto_accept(),
            min_similarity: default_min_similarity(),
            max_alternatives: default_max_alternatives(),
            scorer: ScorerKind::default(),
        }
    }
}

fn default_auto_accept() -> f64 {
    0.85
}

fn default_min_similarity() -> f64 {
    0.6
}

fn default_max_alternatives() -> usize {
    5
}

/// Leaderboard defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregationSection {
    /// Entries returned when a request sets no limit (default: 10).
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Upstream fetches in flight at once (default: 8).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,
    /// Season used when a request names none (default: "2024").
    #[serde(default = "default_season")]
    pub season: String,
}

impl Default for AggregationSection {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_concurrent_fetches: default_max_concurrent(),
            season: default_season(),
        }
    }
}

fn default_limit() -> usize {
    10
}

fn default_max_concurrent() -> usize {
    8
}

fn default_season() -> String {
    DEFAULT_SEASON.to_string()
}

/// Upstream call limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamSection {
    /// Per-call timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Attempts per call including the first; 1 disables retry (default: 3).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 500).
    #[serde(default = "default_retry_initial_delay")]
    pub retry_initial_delay_ms: u64,
    /// Cap on the retry delay in milliseconds (default: 30000).
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_initial_delay() -> u64 {
    500
}

fn default_retry_max_delay() -> u64 {
    30_000
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing file of
    /// `~/.statline/config.toml` and `/etc/statline/config.toml` is used,
    /// falling back to defaults when neither exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| StatlineError::Configuration(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StatlineError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            StatlineError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(StatlineError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".statline").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/statline/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Reject values no engine could run with.
    pub fn validate(&self) -> Result<()> {
        let r = &self.resolver;
        for (name, value) in [
            ("resolver.auto_accept", r.auto_accept),
            ("resolver.min_similarity", r.min_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StatlineError::Configuration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if r.min_similarity > r.auto_accept {
            return Err(StatlineError::Configuration(format!(
                "resolver.min_similarity ({}) exceeds resolver.auto_accept ({})",
                r.min_similarity, r.auto_accept
            )));
        }
        if self.aggregation.default_limit == 0 {
            return Err(StatlineError::Configuration(
                "aggregation.default_limit must be positive".to_string(),
            ));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(StatlineError::Configuration(
                "upstream.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub fn cache_config(&self) -> DomainCacheConfig {
        let c = &self.cache;
        DomainCacheConfig::new()
            .max_entries(c.max_entries)
            .ttl(TtlPolicy {
                player_identity: Duration::from_secs(c.player_identity_ttl_secs),
                player_stats: Duration::from_secs(c.player_stats_ttl_secs),
                team_roster: Duration::from_secs(c.team_roster_ttl_secs),
                team_list: Duration::from_secs(c.team_list_ttl_secs),
            })
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        let r = &self.resolver;
        ResolverConfig::new()
            .auto_accept(r.auto_accept)
            .min_similarity(r.min_similarity)
            .max_alternatives(r.max_alternatives)
            .scorer(r.scorer)
            .fetch_timeout(self.fetch_timeout())
            .max_concurrent_fetches(self.aggregation.max_concurrent_fetches)
    }

    pub fn aggregation_config(&self) -> AggregationConfig {
        let a = &self.aggregation;
        AggregationConfig::new()
            .default_limit(a.default_limit)
            .max_concurrent_fetches(a.max_concurrent_fetches)
            .fetch_timeout(self.fetch_timeout())
            .default_season(a.season.clone())
    }

    pub fn retry_config(&self) -> RetryConfig {
        let u = &self.upstream;
        RetryConfig::new()
            .max_attempts(u.retry_attempts.max(1))
            .initial_delay(Duration::from_millis(u.retry_initial_delay_ms))
            .max_delay(Duration::from_millis(u.retry_max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.cache.max_entries, 10_000);
        assert_eq!(config.cache.player_stats_ttl_secs, 3600);
        assert_eq!(config.resolver.auto_accept, 0.85);
        assert_eq!(config.resolver.scorer, ScorerKind::JaroWinkler);
        assert_eq!(config.aggregation.default_limit, 10);
        assert_eq!(config.upstream.retry_attempts, 3);
        assert_eq!(config.cache_config().ttl, TtlPolicy::default());
    }

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_toml_str(
            r#"
            [resolver]
            scorer = "token_jaccard"
        "#,
        )
        .unwrap();
        assert_eq!(config.resolver.scorer, ScorerKind::TokenJaccard);
        assert_eq!(config.resolver.min_similarity, 0.6);
        assert_eq!(config.upstream, UpstreamSection::default());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = Config::from_toml_str(
            r#"
            [resolver]
            auto_accept = 0.5
            min_similarity = 0.7
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, StatlineError::Configuration(_)));
    }

    #[test]
    fn unknown_scorer_is_a_parse_error() {
        assert!(Config::from_toml_str("[resolver]\nscorer = \"soundex\"").is_err());
    }
}
