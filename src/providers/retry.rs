//! Retry configuration, delay calculation, and provider decorator.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! [`RetryingProvider`], a decorator that wraps both collaborator traits
//! with automatic retry on transient errors.
//!
//! Every decorated call goes through the shared `with_retry()` helper,
//! keeping retry logic in a single place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::{RosterProvider, StatsProvider};
use crate::telemetry;
use crate::types::{PlayerRecord, Roster, StatLine, Team};
use crate::{Result, StatlineError};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff, capped at `max_delay`:
///
/// ```rust
/// # use statline::providers::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Uses exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Calculate the effective delay, respecting provider `retry_after` hints.
    ///
    /// If a `retry_after` duration is provided (from a `RateLimited` error),
    /// it takes precedence over the calculated backoff.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

// ============================================================================
// Shared retry helper
// ============================================================================

/// Execute an async operation with retry logic.
///
/// Retries on transient errors (as classified by [`StatlineError::is_transient()`])
/// up to `config.max_attempts`, using exponential backoff and respecting
/// `retry_after` hints from `RateLimited` errors.
///
/// Permanent errors are returned immediately without retry.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    operation: &'static str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..config.max_attempts.max(1) {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < config.max_attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "provider" => provider_name.to_owned(),
                        "operation" => operation,
                    )
                    .increment(1);
                    let delay = config.effective_delay(attempt, e.retry_after());
                    warn!(
                        provider = provider_name,
                        operation,
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e), // permanent error, no retry
        }
    }
    Err(last_err.unwrap_or(StatlineError::Unavailable(format!(
        "{operation} made no attempts"
    ))))
}

// ============================================================================
// RetryingProvider
// ============================================================================

/// Decorator that wraps roster and stats providers with retry logic.
///
/// On transient errors (rate limits, temporary unavailability) retries with
/// exponential backoff up to `config.max_attempts`. Permanent errors and
/// `Ok(None)` lookups are returned immediately.
pub struct RetryingProvider<P: ?Sized> {
    inner: Arc<P>,
    config: RetryConfig,
}

impl<P: ?Sized> RetryingProvider<P> {
    /// Wrap a provider with retry logic.
    pub fn new(inner: Arc<P>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<P> RosterProvider for RetryingProvider<P>
where
    P: RosterProvider + ?Sized,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_team_list(&self, sport: &str) -> Result<Vec<Team>> {
        with_retry(&self.config, self.inner.name(), "fetch_team_list", || {
            self.inner.fetch_team_list(sport)
        })
        .await
    }

    async fn fetch_team_roster(&self, sport: &str, team_id: &str) -> Result<Roster> {
        with_retry(&self.config, self.inner.name(), "fetch_team_roster", || {
            self.inner.fetch_team_roster(sport, team_id)
        })
        .await
    }

    async fn fetch_player_by_name(&self, sport: &str, name: &str) -> Result<Option<PlayerRecord>> {
        with_retry(&self.config, self.inner.name(), "fetch_player_by_name", || {
            self.inner.fetch_player_by_name(sport, name)
        })
        .await
    }
}

#[async_trait]
impl<P> StatsProvider for RetryingProvider<P>
where
    P: StatsProvider + ?Sized,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_player_stats(
        &self,
        sport: &str,
        player_id: &str,
        season: &str,
        metrics: &[String],
    ) -> Result<StatLine> {
        with_retry(&self.config, self.inner.name(), "fetch_player_stats", || {
            self.inner.fetch_player_stats(sport, player_id, season, metrics)
        })
        .await
    }
}
