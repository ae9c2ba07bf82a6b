//! Generic keyed store with lazy, caller-supplied expiry.
//!
//! [`TtlStore`] knows nothing about namespaces: every read states the TTL it
//! is willing to accept, and [`TtlStore::sweep`] asks the caller for the TTL
//! of each key. Expiry is evaluated at read time, so a sweep is never needed
//! for correctness; it only bounds memory.
//!
//! Entries live in a bounded moka cache, which handles concurrent access
//! internally. Timestamps come from [`tokio::time::Instant`], so tests can
//! pause and advance time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use tokio::time::Instant;

/// Default maximum number of entries held by a store.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// A stored value and the moment it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// Thread-safe keyed store with per-entry timestamps.
///
/// Counts hits, misses and writes; counters use relaxed atomics and are
/// not linearized with map mutations.
pub struct TtlStore<V> {
    entries: Cache<String, CacheEntry<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl<V> TtlStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a store holding at most [`DEFAULT_MAX_ENTRIES`] entries.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    /// Look up `key`, accepting entries no older than `ttl`.
    ///
    /// An expired entry counts as a miss and is removed.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now, ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.remove_if_expired(key, now, ttl);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `value` under `key`, overwriting any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };
        self.entries.insert(key.into(), entry);
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove `key` unconditionally.
    pub fn remove(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Remove every entry whose TTL, as reported by `ttl_for`, has elapsed
    /// at `now`. Keys for which `ttl_for` returns `None` are kept.
    ///
    /// Returns the removed keys.
    pub fn sweep<F>(&self, now: Instant, ttl_for: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<Duration>,
    {
        let mut removed = Vec::new();
        for key in self.keys() {
            let Some(ttl) = ttl_for(&key) else {
                continue;
            };
            if self.remove_if_expired(&key, now, ttl) {
                removed.push(key);
            }
        }
        removed
    }

    /// Remove all entries. Counters are left untouched.
    pub fn clear(&self) {
        for key in self.keys() {
            self.entries.invalidate(&key);
        }
        self.entries.invalidate_all();
    }

    /// Snapshot of the keys currently held (expired or not).
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.as_ref().clone()).collect()
    }

    /// Number of entries currently held (expired or not).
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stores(&self) -> u64 {
        self.stores.load(Ordering::Relaxed)
    }

    /// Zero the hit/miss/store counters.
    pub fn reset_counters(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.stores.store(0, Ordering::Relaxed);
    }

    /// Atomically remove `key` only if it is still expired, so a fresh
    /// concurrent `set` is never lost.
    fn remove_if_expired(&self, key: &str, now: Instant, ttl: Duration) -> bool {
        let result = self
            .entries
            .entry_by_ref(key)
            .and_compute_with(|maybe_entry| match maybe_entry {
                Some(entry) if entry.value().is_expired(now, ttl) => Op::Remove,
                _ => Op::Nop,
            });
        matches!(result, CompResult::Removed(_))
    }
}

impl<V> Default for TtlStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
