//! Evlink - short-link core for event registrations
//!
//! This library mints compact, collision-free public keys that resolve to
//! event-registration targets, validates caller-chosen custom keys against a
//! reserved namespace, and serves resolution lookups through a time-bounded
//! in-memory cache backed by an authoritative link store.
//!
//! # Features
//! - **metrics**: Prometheus counter/histogram backend
//! - **test-util**: exposes the cache test seam and `ManualClock`
//!
//! # Architecture
//! - `cache`: TTL resolution cache with eager stale pruning
//! - `storage`: link store trait and in-memory reference backend
//! - `keygen`: random key source and bounded collision retry
//! - `policy`: custom-key validation against the reserved namespace
//! - `services`: resolution (read path) and get-or-create (write path)
//! - `config`: configuration loading and validation
//! - `metrics_core`: metrics trait seam, always compiled

pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod keygen;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod metrics_core;
pub mod policy;
pub mod services;
pub mod storage;
