//! Upstream collaborators: traits, decorators, and a fixture-backed provider.

pub mod fixture;
pub mod retry;
pub mod traits;

pub use fixture::{Fixture, FixtureStats, StaticProvider};
pub use retry::{RetryConfig, RetryingProvider};
pub use traits::{RosterProvider, StatsProvider};

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::telemetry;
use crate::{Result, StatlineError};

/// Run one upstream call bounded by `timeout`, recording request metrics.
///
/// A timeout becomes [`StatlineError::Timeout`]; it is a fetch failure like
/// any other and callers must not touch the cache on it.
pub(crate) async fn bounded<T, Fut>(operation: &'static str, timeout: Duration, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StatlineError::Timeout {
            operation,
            after: timeout,
        }),
    };

    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
        "operation" => operation,
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS, "operation" => operation)
        .record(start.elapsed().as_secs_f64());

    if let Err(ref e) = result {
        warn!(operation, error = %e, "upstream call failed");
    }
    result
}
