//! Prometheus-backed `MetricsRecorder`.
//!
//! Constructor-owned registry, injected into the orchestrators like any
//! other collaborator.

use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::metrics_core::MetricsRecorder;

pub struct PrometheusMetrics {
    registry: Registry,

    /// Resolution outcomes by status
    resolve_total: CounterVec,
    /// Cache hits by hit type
    cache_hits_total: CounterVec,
    /// Cache misses
    cache_misses_total: Counter,
    /// Stale evictions by reason
    stale_evictions_total: CounterVec,
    /// Failed store calls by operation
    store_errors_total: CounterVec,
    /// Resolve duration by final status
    resolve_duration_seconds: HistogramVec,
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let resolve_total = CounterVec::new(
            Opts::new("evlink_resolve_total", "Resolution outcomes by status"),
            &["status"],
        )
        .expect("Failed to create resolve_total metric");

        let cache_hits_total = CounterVec::new(
            Opts::new("evlink_cache_hits_total", "Cache hits by hit type"),
            &["type"],
        )
        .expect("Failed to create cache_hits_total metric");

        let cache_misses_total = Counter::new("evlink_cache_misses_total", "Cache misses")
            .expect("Failed to create cache_misses_total metric");

        let stale_evictions_total = CounterVec::new(
            Opts::new(
                "evlink_stale_evictions_total",
                "Cached Active entries found lapsed at revalidation, by reason",
            ),
            &["reason"],
        )
        .expect("Failed to create stale_evictions_total metric");

        let store_errors_total = CounterVec::new(
            Opts::new("evlink_store_errors_total", "Failed store calls by operation"),
            &["operation"],
        )
        .expect("Failed to create store_errors_total metric");

        let resolve_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "evlink_resolve_duration_seconds",
                "Resolve duration by final status",
            ),
            &["status"],
        )
        .expect("Failed to create resolve_duration_seconds metric");

        registry
            .register(Box::new(resolve_total.clone()))
            .expect("Failed to register resolve_total");
        registry
            .register(Box::new(cache_hits_total.clone()))
            .expect("Failed to register cache_hits_total");
        registry
            .register(Box::new(cache_misses_total.clone()))
            .expect("Failed to register cache_misses_total");
        registry
            .register(Box::new(stale_evictions_total.clone()))
            .expect("Failed to register stale_evictions_total");
        registry
            .register(Box::new(store_errors_total.clone()))
            .expect("Failed to register store_errors_total");
        registry
            .register(Box::new(resolve_duration_seconds.clone()))
            .expect("Failed to register resolve_duration_seconds");

        Self {
            registry,
            resolve_total,
            cache_hits_total,
            cache_misses_total,
            stale_evictions_total,
            store_errors_total,
            resolve_duration_seconds,
        }
    }

    /// Export all metrics in Prometheus text format.
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("Failed to encode metrics");
        String::from_utf8(buffer).expect("Metrics output is not valid UTF-8")
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for PrometheusMetrics {
    fn inc_resolve(&self, status: &str) {
        self.resolve_total.with_label_values(&[status]).inc();
    }

    fn inc_cache_hit(&self, hit_type: &str) {
        self.cache_hits_total.with_label_values(&[hit_type]).inc();
    }

    fn inc_cache_miss(&self) {
        self.cache_misses_total.inc();
    }

    fn inc_stale_eviction(&self, reason: &str) {
        self.stale_evictions_total.with_label_values(&[reason]).inc();
    }

    fn observe_resolve_duration(&self, status: &str, duration_secs: f64) {
        self.resolve_duration_seconds
            .with_label_values(&[status])
            .observe(duration_secs);
    }

    fn inc_store_error(&self, operation: &str) {
        self.store_errors_total
            .with_label_values(&[operation])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_exports_counters() {
        let metrics = PrometheusMetrics::new();
        metrics.inc_resolve("active");
        metrics.inc_resolve("active");
        metrics.inc_resolve("expired");
        metrics.inc_cache_hit("positive");
        metrics.inc_cache_miss();
        metrics.inc_stale_eviction("expired");
        metrics.observe_resolve_duration("active", 0.002);
        metrics.inc_store_error("find_by_key");

        let output = metrics.export();
        assert!(output.contains("evlink_resolve_total{status=\"active\"} 2"));
        assert!(output.contains("evlink_resolve_total{status=\"expired\"} 1"));
        assert!(output.contains("evlink_cache_hits_total{type=\"positive\"} 1"));
        assert!(output.contains("evlink_cache_misses_total 1"));
        assert!(output.contains("evlink_stale_evictions_total{reason=\"expired\"} 1"));
        assert!(output.contains("evlink_store_errors_total{operation=\"find_by_key\"} 1"));
        assert!(output.contains("evlink_resolve_duration_seconds"));
    }
}
