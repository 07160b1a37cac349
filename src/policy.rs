//! Custom-key validation and normalization.
//!
//! The existence pre-check here is advisory: two concurrent requests can both
//! pass it, and the store's unique constraint stays the final arbiter. The
//! write path translates that conflict back into the same `KeyTaken` outcome.

use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::{EvlinkError, Result};
use crate::keygen::{KEY_MAX_LENGTH, KEY_MIN_LENGTH};
use crate::storage::{LinkStore, ShortLink};

/// Outcome of a successful validation.
#[derive(Debug, Clone)]
pub enum KeyDecision {
    /// Normalized key is free to claim.
    Available(String),
    /// The key already points at the requested target; idempotent success.
    ExistingForTarget(ShortLink),
}

pub struct CustomKeyPolicy {
    store: Arc<dyn LinkStore>,
    reserved: HashSet<String>,
    min_length: usize,
    max_length: usize,
}

impl CustomKeyPolicy {
    pub fn new(
        store: Arc<dyn LinkStore>,
        reserved: impl IntoIterator<Item = String>,
        min_length: usize,
        max_length: usize,
    ) -> Result<Self> {
        if min_length < KEY_MIN_LENGTH || max_length > KEY_MAX_LENGTH || min_length > max_length {
            return Err(EvlinkError::configuration(format!(
                "custom key bounds {}-{} must stay within {}-{}",
                min_length, max_length, KEY_MIN_LENGTH, KEY_MAX_LENGTH
            )));
        }
        // Membership checks run against normalized input, so the set is
        // normalized the same way.
        let reserved = reserved.into_iter().map(|word| word.to_lowercase()).collect();
        Ok(Self {
            store,
            reserved,
            min_length,
            max_length,
        })
    }

    /// Lowercase, check format and reserved words, then pre-check uniqueness
    /// at the store.
    pub async fn validate_and_normalize(
        &self,
        raw_key: &str,
        target_event_id: &str,
    ) -> Result<KeyDecision> {
        // Lowercasing happens before any other check so case is never a
        // bypass for format or reserved-word rules.
        let normalized = raw_key.to_lowercase();

        let length = normalized.chars().count();
        if length < self.min_length || length > self.max_length {
            return Err(EvlinkError::invalid_key_format(format!(
                "key must be {}-{} characters, got {}",
                self.min_length, self.max_length, length
            )));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(EvlinkError::invalid_key_format(format!(
                "key '{}' may only contain lowercase letters, digits and hyphens",
                normalized
            )));
        }
        if self.reserved.contains(&normalized) {
            return Err(EvlinkError::reserved_key(format!(
                "key '{}' is reserved",
                normalized
            )));
        }

        match self.store.find_by_key(&normalized).await? {
            Some(existing) if existing.target_event_id == target_event_id => {
                Ok(KeyDecision::ExistingForTarget(existing))
            }
            Some(_) => Err(EvlinkError::key_taken(format!(
                "key '{}' already points at another target",
                normalized
            ))),
            None => Ok(KeyDecision::Available(normalized)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::storage::MemoryStore;

    fn default_reserved() -> Vec<String> {
        vec![
            "health".to_string(),
            "metrics".to_string(),
            "api".to_string(),
            "admin".to_string(),
        ]
    }

    fn policy_with_store() -> (CustomKeyPolicy, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let policy = CustomKeyPolicy::new(
            store.clone(),
            default_reserved(),
            KEY_MIN_LENGTH,
            KEY_MAX_LENGTH,
        )
        .unwrap();
        (policy, store)
    }

    fn link(key: &str, event_id: &str) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            key: key.to_string(),
            target_event_id: event_id.to_string(),
            target_slug: format!("{}-slug", event_id),
            created_by: "alice".to_string(),
            created_at: now,
            expires_at: now + Duration::days(1),
            is_expired: false,
        }
    }

    #[tokio::test]
    async fn rejects_too_short_key() {
        let (policy, _store) = policy_with_store();
        let err = policy.validate_and_normalize("ab", "ev1").await.unwrap_err();
        assert!(matches!(err, EvlinkError::InvalidKeyFormat(_)));
    }

    #[tokio::test]
    async fn rejects_too_long_key() {
        let (policy, _store) = policy_with_store();
        let err = policy
            .validate_and_normalize("a".repeat(20).as_str(), "ev1")
            .await
            .unwrap_err();
        assert!(matches!(err, EvlinkError::InvalidKeyFormat(_)));
    }

    #[tokio::test]
    async fn rejects_bad_characters() {
        let (policy, _store) = policy_with_store();
        let err = policy
            .validate_and_normalize("my@key!", "ev1")
            .await
            .unwrap_err();
        assert!(matches!(err, EvlinkError::InvalidKeyFormat(_)));
    }

    #[tokio::test]
    async fn reserved_check_is_case_insensitive() {
        let (policy, _store) = policy_with_store();
        let err = policy
            .validate_and_normalize("METRICS", "ev1")
            .await
            .unwrap_err();
        assert!(matches!(err, EvlinkError::ReservedKey(_)));
    }

    #[tokio::test]
    async fn key_owned_by_other_target_is_taken() {
        let (policy, store) = policy_with_store();
        store.create(link("my-key", "ev1")).await.unwrap();

        let err = policy
            .validate_and_normalize("my-key", "ev2")
            .await
            .unwrap_err();
        assert!(matches!(err, EvlinkError::KeyTaken(_)));
    }

    #[tokio::test]
    async fn same_target_re_request_is_idempotent() {
        let (policy, store) = policy_with_store();
        store.create(link("my-key", "ev1")).await.unwrap();

        match policy.validate_and_normalize("My-Key", "ev1").await.unwrap() {
            KeyDecision::ExistingForTarget(existing) => assert_eq!(existing.key, "my-key"),
            other => panic!("expected existing link, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unused_key_is_normalized_and_accepted() {
        let (policy, _store) = policy_with_store();
        match policy
            .validate_and_normalize("My-Custom-Key", "ev1")
            .await
            .unwrap()
        {
            KeyDecision::Available(key) => assert_eq!(key, "my-custom-key"),
            other => panic!("expected available key, got {:?}", other),
        }
    }

    #[test]
    fn constructor_rejects_out_of_range_bounds() {
        let store: Arc<dyn LinkStore> = Arc::new(MemoryStore::new());
        assert!(CustomKeyPolicy::new(store.clone(), default_reserved(), 2, 16).is_err());
        assert!(CustomKeyPolicy::new(store.clone(), default_reserved(), 3, 17).is_err());
        assert!(CustomKeyPolicy::new(store, default_reserved(), 10, 4).is_err());
    }
}
