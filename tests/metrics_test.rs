//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use statline::cache::{DomainCache, PLAYER_LOOKUP_CALLS_SAVED};
use statline::providers::StaticProvider;
use statline::resolve::{Resolver, ResolverConfig};
use statline::telemetry;
use statline::{PlayerRecord, StatLine, Team};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a metric name and, optionally, one label.
fn counter_total(snapshot: &SnapshotVec, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .filter(|(key, _, _, _)| match label {
            Some((k, v)) => key.key().labels().any(|l| l.key() == k && l.value() == v),
            None => true,
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn league() -> StaticProvider {
    StaticProvider::default()
        .with_team(Team::new("DAL", "Dallas Cowboys", "DAL", "NFL"))
        .with_player(PlayerRecord::new("1", "Micah Parsons", "LB", "DAL", "NFL"))
        .with_stats("NFL", "1", "2024", StatLine::new().with("sacks", 12.5))
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn cache_lookups_record_namespace_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let cache = DomainCache::new();
        cache.get_player("NFL", "micah parsons");
        cache.set_player(
            "NFL",
            "micah parsons",
            Arc::new(PlayerRecord::new("1", "Micah Parsons", "LB", "DAL", "NFL")),
        );
        cache.get_player("NFL", "micah parsons");
        cache.get_stats("NFL", "1", "2024", &["sacks"]);
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::CACHE_HITS_TOTAL,
            Some(("namespace", "player_identity"))
        ),
        1
    );
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::CACHE_MISSES_TOTAL,
            Some(("namespace", "player_identity"))
        ),
        1
    );
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::CACHE_MISSES_TOTAL,
            Some(("namespace", "player_stats"))
        ),
        1
    );
    assert_eq!(
        counter_total(&snapshot, telemetry::API_CALLS_SAVED_TOTAL, None),
        PLAYER_LOOKUP_CALLS_SAVED
    );
}

#[test]
fn expiry_sweep_records_evictions() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    let removed = metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let cache = DomainCache::new();
            cache.set_stats("NFL", "1", "2024", &["sacks"], StatLine::new());
            tokio::time::advance(std::time::Duration::from_secs(3601)).await;
            cache.clear_expired()
        })
    });
    assert_eq!(removed, 1);

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::CACHE_EVICTIONS_TOTAL,
            Some(("namespace", "player_stats"))
        ),
        1
    );
}

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn resolution_records_upstream_and_outcome_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let resolver = Resolver::new(
                    Arc::new(DomainCache::new()),
                    Arc::new(league()),
                    ResolverConfig::default(),
                );
                resolver.resolve("NFL", "Micah Parsons").await
            })
        })
    });
    assert!(result.unwrap().is_resolved());

    let snapshot = snapshotter.snapshot().into_vec();

    // team list plus one roster
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::UPSTREAM_REQUESTS_TOTAL,
            Some(("status", "ok"))
        ),
        2
    );
    assert!(
        has_histogram(&snapshot, telemetry::UPSTREAM_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::RESOLUTIONS_TOTAL,
            Some(("outcome", "resolved"))
        ),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn not_found_resolution_is_labelled() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let _result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let resolver = Resolver::new(
                    Arc::new(DomainCache::new()),
                    Arc::new(league()),
                    ResolverConfig::default(),
                );
                resolver.resolve("NFL", "Zzyzx Qqq").await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::RESOLUTIONS_TOTAL,
            Some(("outcome", "not_found"))
        ),
        1
    );
    // the name lookup went upstream too
    assert_eq!(
        counter_total(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, None),
        3
    );
}

#[test]
fn no_recorder_is_a_no_op() {
    let cache = DomainCache::new();
    assert!(cache.get_player("NFL", "anyone").is_none());
    assert_eq!(cache.stats().misses, 1);
}
