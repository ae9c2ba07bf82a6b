//! Tests for configuration loading from disk.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use statline::providers::StaticProvider;
use statline::resolve::ScorerKind;
use statline::{Config, StatEngine, StatlineError};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_explicit_file() {
    let file = write_config(
        r#"
        [cache]
        player_stats_ttl_secs = 600

        [resolver]
        auto_accept = 0.9
        scorer = "levenshtein"

        [aggregation]
        default_limit = 25
        season = "2023"

        [upstream]
        timeout_secs = 5
        retry_attempts = 1
    "#,
    );

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.cache.player_stats_ttl_secs, 600);
    // untouched fields keep defaults
    assert_eq!(config.cache.team_roster_ttl_secs, 6 * 3600);
    assert_eq!(config.resolver.scorer, ScorerKind::Levenshtein);
    assert_eq!(config.aggregation.default_limit, 25);
    assert_eq!(config.fetch_timeout(), Duration::from_secs(5));

    let aggregation = config.aggregation_config();
    assert_eq!(aggregation.default_season, "2023");
    assert_eq!(aggregation.fetch_timeout, Duration::from_secs(5));
    assert_eq!(config.retry_config().max_attempts, 1);
    assert_eq!(config.resolver_config().auto_accept, 0.9);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
    assert!(matches!(err, StatlineError::Configuration(_)));
}

#[test]
fn malformed_file_is_an_error() {
    let file = write_config("[cache\nmax_entries = ");
    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, StatlineError::Configuration(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_config("[upstream]\ntimeout_secs = 0\n");
    assert!(Config::load(Some(file.path())).is_err());

    let file = write_config("[aggregation]\ndefault_limit = 0\n");
    assert!(Config::load(Some(file.path())).is_err());

    let file = write_config("[resolver]\nauto_accept = 1.5\n");
    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
fn empty_file_is_all_defaults() {
    let file = write_config("");
    assert_eq!(Config::load(Some(file.path())).unwrap(), Config::default());
}

#[tokio::test]
async fn builder_applies_cache_ttls() {
    let config = Config::from_toml_str(
        r#"
        [cache]
        player_identity_ttl_secs = 30
        team_roster_ttl_secs = 120
    "#,
    )
    .unwrap();

    let engine = StatEngine::builder()
        .config(&config)
        .provider(Arc::new(StaticProvider::default()))
        .build()
        .unwrap();

    let ttl = engine.cache().ttl_policy();
    assert_eq!(ttl.player_identity, Duration::from_secs(30));
    assert_eq!(ttl.team_roster, Duration::from_secs(120));
    assert_eq!(ttl.player_stats, Duration::from_secs(3600));
}
