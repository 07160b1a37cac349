//! Get-or-create write path.
//!
//! Repeated calls for the same target return the existing key instead of
//! minting duplicates. Custom keys go through `CustomKeyPolicy`; generated
//! keys through `KeyGenerator`. Either way the store's unique constraint is
//! the final arbiter, and a duplicate-key conflict on a caller-chosen key
//! surfaces as the same `KeyTaken` the pre-check would have produced.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::cache::ResolutionCache;
use crate::clock::Clock;
use crate::errors::{EvlinkError, Result};
use crate::keygen::KeyGenerator;
use crate::policy::{CustomKeyPolicy, KeyDecision};
use crate::storage::{LinkStore, ResolvedTarget, ShortLink};

/// Request to mint (or fetch) the short link for an event target.
#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    pub target_event_id: String,
    pub target_slug: String,
    /// End of the target event; `expires_at` is derived from this plus the
    /// configured grace.
    pub event_ends_at: DateTime<Utc>,
    pub created_by: String,
    /// Caller-chosen key (optional, generated if not provided).
    pub custom_key: Option<String>,
}

/// Result of a get-or-create call.
#[derive(Debug, Clone)]
pub struct GetOrCreateResult {
    pub link: ShortLink,
    /// False when an existing link was returned instead of minting one.
    pub created: bool,
}

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: Arc<ResolutionCache>,
    keygen: KeyGenerator,
    policy: CustomKeyPolicy,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        cache: Arc<ResolutionCache>,
        keygen: KeyGenerator,
        policy: CustomKeyPolicy,
        clock: Arc<dyn Clock>,
        grace_secs: u64,
    ) -> Self {
        Self {
            store,
            cache,
            keygen,
            policy,
            clock,
            grace: Duration::seconds(grace_secs as i64),
        }
    }

    pub async fn get_or_create(&self, request: CreateLinkRequest) -> Result<GetOrCreateResult> {
        if let Some(raw_key) = request
            .custom_key
            .clone()
            .filter(|key| !key.is_empty())
        {
            return self.create_with_custom_key(&raw_key, &request).await;
        }

        if let Some(existing) = self
            .store
            .find_by_target(&request.target_event_id, &request.created_by)
            .await?
        {
            debug!(
                key = %existing.key,
                event = %request.target_event_id,
                "returning existing link for target"
            );
            return Ok(GetOrCreateResult {
                link: existing,
                created: false,
            });
        }

        self.create_with_generated_key(&request).await
    }

    async fn create_with_custom_key(
        &self,
        raw_key: &str,
        request: &CreateLinkRequest,
    ) -> Result<GetOrCreateResult> {
        match self
            .policy
            .validate_and_normalize(raw_key, &request.target_event_id)
            .await?
        {
            KeyDecision::ExistingForTarget(link) => Ok(GetOrCreateResult {
                link,
                created: false,
            }),
            KeyDecision::Available(key) => match self.persist(key.clone(), request).await {
                Ok(link) => Ok(GetOrCreateResult {
                    link,
                    created: true,
                }),
                // The pre-check is advisory; a concurrent writer may have
                // claimed the key between check and write.
                Err(EvlinkError::DuplicateKey(_)) => Err(EvlinkError::key_taken(format!(
                    "key '{}' already points at another target",
                    key
                ))),
                Err(err) => Err(err),
            },
        }
    }

    async fn create_with_generated_key(
        &self,
        request: &CreateLinkRequest,
    ) -> Result<GetOrCreateResult> {
        let options = *self.keygen.options();
        let mut conflicts = 0;
        loop {
            let key = self.keygen.generate().await?;
            match self.persist(key, request).await {
                Ok(link) => {
                    return Ok(GetOrCreateResult {
                        link,
                        created: true,
                    });
                }
                // Lost a write race on a generated key; re-enter the bounded
                // generation loop instead of surfacing a key the caller
                // never chose.
                Err(EvlinkError::DuplicateKey(_)) => {
                    conflicts += 1;
                    if conflicts > options.max_collision_retries {
                        return Err(EvlinkError::generation_exhausted(
                            options.min_length,
                            options.max_length,
                            conflicts,
                        ));
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn persist(&self, key: String, request: &CreateLinkRequest) -> Result<ShortLink> {
        let now = self.clock.now();
        let link = ShortLink {
            key,
            target_event_id: request.target_event_id.clone(),
            target_slug: request.target_slug.clone(),
            created_by: request.created_by.clone(),
            created_at: now,
            expires_at: request.event_ends_at + self.grace,
            is_expired: false,
        };

        let stored = self.store.create(link).await?;

        // Prime the cache so the first resolution skips the store.
        self.cache.insert(&stored.key, ResolvedTarget::from(&stored));
        info!(
            key = %stored.key,
            event = %stored.target_event_id,
            "created short link"
        );
        Ok(stored)
    }
}
