//! Resolution read path.
//!
//! Cache first, store on miss or detected staleness. The cache trades a
//! bounded staleness window (up to its TTL, or until the link's own
//! `expires_at`, whichever is sooner) for skipping a store round-trip per
//! lookup; the stale-eviction counter makes that window observable so
//! operators can tune the TTL.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::cache::{CacheEntry, CacheLookup, ResolutionCache, ResolutionStatus};
use crate::clock::Clock;
use crate::errors::Result;
use crate::metrics_core::MetricsRecorder;
use crate::storage::{LinkStore, ResolvedTarget};

/// Terminal resolution outcome. `Expired` and `NotFound` are outcomes, not
/// failures of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Active(ResolvedTarget),
    /// The key existed but its target has lapsed. A previously valid key is
    /// always Expired, never NotFound.
    Expired,
    /// The key never existed.
    NotFound,
}

impl Resolution {
    pub fn status(&self) -> ResolutionStatus {
        match self {
            Resolution::Active(_) => ResolutionStatus::Active,
            Resolution::Expired => ResolutionStatus::Expired,
            Resolution::NotFound => ResolutionStatus::NotFound,
        }
    }
}

pub struct Resolver {
    cache: Arc<ResolutionCache>,
    store: Arc<dyn LinkStore>,
    metrics: Arc<dyn MetricsRecorder>,
    clock: Arc<dyn Clock>,
}

impl Resolver {
    pub fn new(
        cache: Arc<ResolutionCache>,
        store: Arc<dyn LinkStore>,
        metrics: Arc<dyn MetricsRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            store,
            metrics,
            clock,
        }
    }

    /// Resolve a key to its target.
    ///
    /// Fails only on `StoreUnavailable`, which advances no cache state and
    /// no metrics beyond the store-error counter.
    pub async fn resolve(&self, key: &str) -> Result<Resolution> {
        let started = Instant::now();
        let now = self.clock.now();

        // A prior cached entry that can no longer be served directly; kept
        // so the staleness transition is attributed after the store answers.
        let prior = match self.cache.get(key) {
            CacheLookup::Hit(entry) => {
                let live_target = entry
                    .payload
                    .clone()
                    .filter(|target| entry.status == ResolutionStatus::Active && target.expires_at > now);
                if let Some(target) = live_target {
                    // Fast path, no store access.
                    self.metrics.inc_cache_hit("positive");
                    return Ok(self.finish(Resolution::Active(target), started));
                }
                // Fresh by TTL, but the embedded expiry has already passed;
                // revalidate at the store instead of serving.
                debug!(key, "cached entry past embedded expiry, revalidating");
                Some(entry)
            }
            CacheLookup::Stale(entry) => {
                self.metrics.inc_cache_miss();
                Some(entry)
            }
            CacheLookup::Miss => {
                self.metrics.inc_cache_miss();
                None
            }
        };

        let record = match self.store.find_by_key(key).await {
            Ok(record) => record,
            Err(err) => {
                self.metrics.inc_store_error("find_by_key");
                return Err(err);
            }
        };

        let resolution = match record {
            Some(link) if !link.is_lapsed(now) => {
                let target = ResolvedTarget::from(&link);
                self.cache.insert(key, target.clone());
                Resolution::Active(target)
            }
            found => {
                self.note_stale_eviction(key, prior.as_ref());
                self.cache.invalidate(key);
                if found.is_some() {
                    Resolution::Expired
                } else {
                    Resolution::NotFound
                }
            }
        };

        Ok(self.finish(resolution, started))
    }

    /// Emitted once per staleness transition: the cache held an Active entry
    /// whose target the store now reports as lapsed or gone.
    fn note_stale_eviction(&self, key: &str, prior: Option<&CacheEntry>) {
        if let Some(entry) = prior {
            if entry.status == ResolutionStatus::Active {
                debug!(key, "cached active entry superseded by lapsed record");
                self.metrics.inc_stale_eviction("expired");
            }
        }
    }

    fn finish(&self, resolution: Resolution, started: Instant) -> Resolution {
        let status = resolution.status().as_str();
        self.metrics.inc_resolve(status);
        self.metrics
            .observe_resolve_duration(status, started.elapsed().as_secs_f64());
        resolution
    }
}
