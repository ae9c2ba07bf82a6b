//! Statline error types

use std::time::Duration;

/// Statline error types
#[derive(Debug, thiserror::Error)]
pub enum StatlineError {
    // Resolution outcomes surfaced as errors by callers that need a single player
    #[error("no player matching '{0}'")]
    NotFound(String),

    #[error("'{name}' is ambiguous ({candidates} candidates)")]
    Ambiguous { name: String, candidates: usize },

    // Upstream collaborator errors
    #[error("upstream error during {operation}: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Every candidate of a ranking query failed to produce a value.
    #[error("aggregation failed: all {failed} candidates errored")]
    AggregationFailed { failed: usize },

    // Classification errors
    #[error("cannot classify query: {0}")]
    Unclassifiable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatlineError {
    /// Whether a retry of the same upstream call may succeed.
    ///
    /// Rate limits and temporary unavailability are transient. Timeouts are
    /// not: the caller-supplied bound is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable(_))
    }

    /// Whether this error originated from an upstream collaborator call.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::RateLimited { .. } | Self::Unavailable(_) | Self::Timeout { .. }
        )
    }

    /// Provider-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Statline operations
pub type Result<T> = std::result::Result<T, StatlineError>;
