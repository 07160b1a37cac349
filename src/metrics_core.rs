//! Core metrics traits (always compiled, no feature gate).
//!
//! Provides the `MetricsRecorder` seam and `NoopMetrics` so orchestrators can
//! accept `Arc<dyn MetricsRecorder>` unconditionally. When the `metrics`
//! feature is disabled, `NoopMetrics` is injected and every call compiles to
//! a no-op.

use std::sync::Arc;

/// Trait for recording resolution and creation metrics.
///
/// All methods are no-op by default, allowing partial implementation.
#[allow(unused_variables)]
pub trait MetricsRecorder: Send + Sync {
    /// Record a resolution outcome, labeled by status
    /// (`active`/`expired`/`not_found`).
    fn inc_resolve(&self, status: &str) {}

    /// Record a cache hit, labeled by hit type (`positive`).
    fn inc_cache_hit(&self, hit_type: &str) {}

    /// Record a cache miss.
    fn inc_cache_miss(&self) {}

    /// Record the discovery of a cached Active entry whose target has since
    /// lapsed, labeled by reason (`expired`).
    fn inc_stale_eviction(&self, reason: &str) {}

    /// Observe end-to-end resolve duration, labeled with the final status.
    fn observe_resolve_duration(&self, status: &str, duration_secs: f64) {}

    /// Record a failed store call, labeled by operation.
    fn inc_store_error(&self, operation: &str) {}
}

/// Noop metrics implementation for tests and non-metrics builds.
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {}

impl NoopMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn MetricsRecorder> {
        Arc::new(Self::new())
    }
}

impl Default for NoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}
