//! Prometheus metrics backend.
//!
//! # Feature
//! This module requires the `metrics` feature to be enabled.

mod registry;

pub use registry::PrometheusMetrics;
