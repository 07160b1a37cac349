//! In-process TTL cache for resolution snapshots.
//!
//! The cache is advisory: it performs no I/O and never errors. Anything it
//! cannot vouch for degrades to a miss, and the caller falls through to the
//! store. All operations are synchronous and non-yielding, so no locking is
//! needed around them on a cooperative scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::clock::Clock;
use crate::storage::ResolvedTarget;

/// Terminal classification of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Active,
    Expired,
    NotFound,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Active => "active",
            ResolutionStatus::Expired => "expired",
            ResolutionStatus::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached resolution snapshot. Never persisted, never mutated in place
/// except to overwrite wholesale on refresh.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub status: ResolutionStatus,
    pub payload: Option<ResolvedTarget>,
    pub cached_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// Fresh while `now < cached_at + ttl`. Once stale the entry must not be
    /// trusted again.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at).num_milliseconds() < self.ttl_ms as i64
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// Fresh entry.
    Hit(CacheEntry),
    /// The entry's TTL had elapsed; it was pruned and is returned exactly
    /// once so the caller can attribute the staleness transition.
    Stale(CacheEntry),
    Miss,
}

pub struct ResolutionCache {
    entries: DashMap<String, CacheEntry>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl ResolutionCache {
    pub fn new(ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms,
            clock,
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Look up a key, eagerly pruning a stale entry so repeated reads do not
    /// re-detect the same staleness.
    pub fn get(&self, key: &str) -> CacheLookup {
        let now = self.clock.now();
        let entry = match self.entries.get(key) {
            Some(entry) => entry.clone(),
            None => return CacheLookup::Miss,
        };

        if entry.is_fresh(now) {
            CacheLookup::Hit(entry)
        } else {
            // Another writer may have refreshed the slot since the read.
            self.entries.remove_if(key, |_, current| !current.is_fresh(now));
            CacheLookup::Stale(entry)
        }
    }

    /// Record a successful Active resolution. The only write path that
    /// populates the cache; no negative caching.
    pub fn insert(&self, key: &str, target: ResolvedTarget) {
        let entry = CacheEntry {
            key: key.to_string(),
            status: ResolutionStatus::Active,
            payload: Some(target),
            cached_at: self.clock.now(),
            ttl_ms: self.ttl_ms,
        };
        self.entries.insert(key.to_string(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry. Test seam only; production code has no bulk
    /// mutation path.
    #[cfg(any(test, feature = "test-util"))]
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Mark an entry as if its TTL had already elapsed, without deleting it.
    /// Lets tests exercise the staleness path without real delays.
    #[cfg(any(test, feature = "test-util"))]
    pub fn force_stale(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            let ttl_ms = entry.ttl_ms;
            entry.cached_at -= chrono::Duration::milliseconds(ttl_ms as i64 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::ManualClock;

    fn target(event_id: &str, expires_in: Duration) -> ResolvedTarget {
        ResolvedTarget {
            event_id: event_id.to_string(),
            slug: format!("{}-slug", event_id),
            expires_at: Utc::now() + expires_in,
        }
    }

    fn cache_with_clock(ttl_ms: u64) -> (ResolutionCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = ResolutionCache::new(ttl_ms, clock.clone());
        (cache, clock)
    }

    #[test]
    fn get_on_empty_cache_is_miss() {
        let (cache, _clock) = cache_with_clock(30_000);
        assert!(matches!(cache.get("abc"), CacheLookup::Miss));
    }

    #[test]
    fn fresh_entry_is_a_hit() {
        let (cache, _clock) = cache_with_clock(30_000);
        cache.insert("abc", target("ev1", Duration::days(1)));

        match cache.get("abc") {
            CacheLookup::Hit(entry) => {
                assert_eq!(entry.status, ResolutionStatus::Active);
                assert_eq!(entry.payload.unwrap().event_id, "ev1");
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn ttl_elapse_reports_stale_once_then_miss() {
        let (cache, clock) = cache_with_clock(1_000);
        cache.insert("abc", target("ev1", Duration::days(1)));

        clock.advance(Duration::milliseconds(1_001));

        assert!(matches!(cache.get("abc"), CacheLookup::Stale(_)));
        // eagerly pruned, second read no longer sees the transition
        assert!(matches!(cache.get("abc"), CacheLookup::Miss));
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn entry_fresh_just_under_ttl_boundary() {
        let (cache, clock) = cache_with_clock(1_000);
        cache.insert("abc", target("ev1", Duration::days(1)));

        clock.advance(Duration::milliseconds(999));
        assert!(matches!(cache.get("abc"), CacheLookup::Hit(_)));

        clock.advance(Duration::milliseconds(1));
        assert!(matches!(cache.get("abc"), CacheLookup::Stale(_)));
    }

    #[test]
    fn force_stale_marks_without_deleting() {
        let (cache, _clock) = cache_with_clock(60_000);
        cache.insert("abc", target("ev1", Duration::days(1)));

        cache.force_stale("abc");
        assert_eq!(cache.entry_count(), 1);

        match cache.get("abc") {
            CacheLookup::Stale(entry) => assert_eq!(entry.key, "abc"),
            other => panic!("expected stale, got {:?}", other),
        }
    }

    #[test]
    fn insert_overwrites_wholesale() {
        let (cache, _clock) = cache_with_clock(30_000);
        cache.insert("abc", target("ev1", Duration::days(1)));
        cache.insert("abc", target("ev2", Duration::days(2)));

        match cache.get("abc") {
            CacheLookup::Hit(entry) => {
                assert_eq!(entry.payload.unwrap().event_id, "ev2");
            }
            other => panic!("expected hit, got {:?}", other),
        }
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn invalidate_and_clear_remove_entries() {
        let (cache, _clock) = cache_with_clock(30_000);
        cache.insert("abc", target("ev1", Duration::days(1)));
        cache.insert("def", target("ev2", Duration::days(1)));

        cache.invalidate("abc");
        assert!(matches!(cache.get("abc"), CacheLookup::Miss));
        assert!(matches!(cache.get("def"), CacheLookup::Hit(_)));

        cache.clear();
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn zero_ttl_never_serves_fresh() {
        let (cache, _clock) = cache_with_clock(0);
        cache.insert("abc", target("ev1", Duration::days(1)));
        assert!(matches!(cache.get("abc"), CacheLookup::Stale(_)));
    }
}
