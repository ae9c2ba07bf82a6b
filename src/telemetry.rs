//! Telemetry metric name constants.
//!
//! Centralised metric names for statline operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `statline_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `namespace`: cache namespace (e.g. "player_identity", "player_stats")
//! - `provider`: upstream provider name
//! - `operation`: collaborator call (e.g. "fetch_team_roster")
//! - `status`: outcome: "ok" or "error"
//! - `outcome`: resolution status: "resolved", "ambiguous", "not_found"

/// Total cache hits.
///
/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "statline_cache_hits_total";

/// Total cache misses (absent or expired).
///
/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "statline_cache_misses_total";

/// Estimated upstream calls avoided by cache hits.
///
/// Labels: `namespace`.
pub const API_CALLS_SAVED_TOTAL: &str = "statline_api_calls_saved_total";

/// Entries removed by expiry sweeps.
///
/// Labels: `namespace`.
pub const CACHE_EVICTIONS_TOTAL: &str = "statline_cache_evictions_total";

/// Total upstream collaborator calls.
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "statline_upstream_requests_total";

/// Upstream call duration in seconds.
///
/// Labels: `operation`.
pub const UPSTREAM_DURATION_SECONDS: &str = "statline_upstream_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `operation`.
pub const RETRIES_TOTAL: &str = "statline_retries_total";

/// Total identity resolutions.
///
/// Labels: `outcome`.
pub const RESOLUTIONS_TOTAL: &str = "statline_resolutions_total";
