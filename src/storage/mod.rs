//! Link store contract and models.
//!
//! The persistent store is the single source of truth for link existence and
//! expiry; everything above it (cache, orchestrators) is advisory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub mod memory;

pub use memory::MemoryStore;

/// A persisted short link. Exactly one non-deleted link may exist per `key`,
/// and one per `(target_event_id, created_by)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub key: String,
    pub target_event_id: String,
    pub target_slug: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Derived from the target event's end time plus grace.
    pub expires_at: DateTime<Utc>,
    /// Settable out of band, independent of `expires_at`.
    #[serde(default)]
    pub is_expired: bool,
}

impl ShortLink {
    /// A link lapses either by explicit flag or by clock comparison.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.is_expired || self.expires_at <= now
    }
}

/// Denormalized resolution payload handed to callers and held in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub event_id: String,
    pub slug: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&ShortLink> for ResolvedTarget {
    fn from(link: &ShortLink) -> Self {
        Self {
            event_id: link.target_event_id.clone(),
            slug: link.target_slug.clone(),
            expires_at: link.expires_at,
        }
    }
}

/// Narrow persistence contract consumed by the core.
///
/// `create` must enforce the unique key constraint and report conflicts as
/// `EvlinkError::DuplicateKey`; transient failures surface as
/// `EvlinkError::StoreUnavailable`.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>>;

    /// Lookup for get-or-create idempotence: the non-deleted link for a
    /// target created by a given caller, if any.
    async fn find_by_target(&self, event_id: &str, created_by: &str)
    -> Result<Option<ShortLink>>;

    async fn create(&self, link: ShortLink) -> Result<ShortLink>;

    /// Used by the out-of-band lifecycle job, not by the orchestrators.
    async fn mark_expired(&self, key: &str) -> Result<()>;
}
