use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use statline::providers::retry::{RetryConfig, RetryingProvider};
use statline::providers::traits::{RosterProvider, StatsProvider};
use statline::{PlayerRecord, Result, Roster, StatLine, StatlineError, Team};

/// Mock provider that fails N times then succeeds.
struct FailThenSucceed {
    fail_count: AtomicU32,
    fail_with: fn() -> StatlineError,
    total_calls: AtomicU32,
}

impl FailThenSucceed {
    fn new(failures: u32, fail_with: fn() -> StatlineError) -> Self {
        Self {
            fail_count: AtomicU32::new(failures),
            fail_with,
            total_calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::Relaxed)
    }

    fn attempt(&self) -> Result<()> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_count.fetch_sub(1, Ordering::Relaxed);
            return Err((self.fail_with)());
        }
        Ok(())
    }
}

#[async_trait]
impl RosterProvider for FailThenSucceed {
    fn name(&self) -> &str {
        "mock-retry"
    }

    async fn fetch_team_list(&self, sport: &str) -> Result<Vec<Team>> {
        self.attempt()?;
        Ok(vec![Team::new("DAL", "Dallas Cowboys", "DAL", sport)])
    }

    async fn fetch_team_roster(&self, _sport: &str, team_id: &str) -> Result<Roster> {
        self.attempt()?;
        Ok(Roster::new(team_id, vec![]))
    }

    async fn fetch_player_by_name(&self, _sport: &str, _name: &str) -> Result<Option<PlayerRecord>> {
        self.attempt()?;
        Ok(None)
    }
}

#[async_trait]
impl StatsProvider for FailThenSucceed {
    fn name(&self) -> &str {
        "mock-retry"
    }

    async fn fetch_player_stats(
        &self,
        _sport: &str,
        _player_id: &str,
        _season: &str,
        _metrics: &[String],
    ) -> Result<StatLine> {
        self.attempt()?;
        Ok(StatLine::new().with("sacks", 12.5))
    }
}

fn fast(max_attempts: u32) -> RetryConfig {
    RetryConfig::new()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
}

fn unavailable() -> StatlineError {
    StatlineError::Unavailable("503 Service Unavailable".into())
}

#[tokio::test]
async fn retries_on_transient_error_then_succeeds() {
    let inner = Arc::new(FailThenSucceed::new(2, || StatlineError::RateLimited {
        retry_after: None,
    }));
    let provider = RetryingProvider::new(inner.clone(), fast(3));

    let result = provider.fetch_player_stats("NFL", "1", "2024", &[]).await;

    assert_eq!(result.unwrap().get("sacks"), Some(12.5));
    assert_eq!(inner.call_count(), 3); // 2 failures + 1 success
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let inner = Arc::new(FailThenSucceed::new(10, unavailable));
    let provider = RetryingProvider::new(inner.clone(), fast(3));

    let result = provider.fetch_team_list("NFL").await;

    assert!(matches!(result, Err(StatlineError::Unavailable(_))));
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn does_not_retry_permanent_errors() {
    let inner = Arc::new(FailThenSucceed::new(1, || StatlineError::Upstream {
        operation: "fetch_team_roster",
        message: "404 Not Found".into(),
    }));
    let provider = RetryingProvider::new(inner.clone(), fast(3));

    let result = provider.fetch_team_roster("NFL", "XXX").await;

    assert!(matches!(result, Err(StatlineError::Upstream { .. })));
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn does_not_retry_timeouts() {
    let inner = Arc::new(FailThenSucceed::new(1, || StatlineError::Timeout {
        operation: "fetch_player_by_name",
        after: Duration::from_secs(10),
    }));
    let provider = RetryingProvider::new(inner.clone(), fast(3));

    let result = provider.fetch_player_by_name("NFL", "Micah Parsons").await;

    assert!(matches!(result, Err(StatlineError::Timeout { .. })));
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn not_found_lookup_is_not_retried() {
    let inner = Arc::new(FailThenSucceed::new(0, unavailable));
    let provider = RetryingProvider::new(inner.clone(), fast(3));

    let result = provider.fetch_player_by_name("NFL", "Nobody").await.unwrap();

    assert!(result.is_none());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn disabled_retry_makes_one_attempt() {
    let inner = Arc::new(FailThenSucceed::new(1, unavailable));
    let provider = RetryingProvider::new(inner.clone(), RetryConfig::disabled());

    assert!(provider.fetch_team_list("NFL").await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_sets_the_delay() {
    let inner = Arc::new(FailThenSucceed::new(1, || StatlineError::RateLimited {
        retry_after: Some(Duration::from_secs(7)),
    }));
    let provider = RetryingProvider::new(inner.clone(), fast(2));

    let start = tokio::time::Instant::now();
    provider
        .fetch_player_stats("NFL", "1", "2024", &[])
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(7));
    assert_eq!(inner.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_between_attempts() {
    let inner = Arc::new(FailThenSucceed::new(3, unavailable));
    let provider = RetryingProvider::new(
        inner.clone(),
        RetryConfig::new()
            .max_attempts(4)
            .initial_delay(Duration::from_millis(100)),
    );

    let start = tokio::time::Instant::now();
    provider.fetch_team_list("NFL").await.unwrap();

    // 100ms + 200ms + 400ms
    assert!(start.elapsed() >= Duration::from_millis(700));
    assert_eq!(inner.call_count(), 4);
}

#[tokio::test]
async fn decorator_keeps_inner_name() {
    let inner = Arc::new(FailThenSucceed::new(0, unavailable));
    let provider = RetryingProvider::new(inner, RetryConfig::default());
    assert_eq!(RosterProvider::name(&provider), "mock-retry");
    assert_eq!(StatsProvider::name(&provider), "mock-retry");
}
