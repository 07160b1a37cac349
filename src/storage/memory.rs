//! In-memory reference backend.
//!
//! Backs tests and single-process deployments. The unique key constraint is
//! enforced atomically through the map's entry API, so concurrent writers
//! racing on the same key observe the same conflict a database would report.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::errors::{EvlinkError, Result};
use crate::storage::{LinkStore, ShortLink};

#[derive(Default)]
pub struct MemoryStore {
    links: DashMap<String, ShortLink>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>> {
        Ok(self.links.get(key).map(|entry| entry.clone()))
    }

    async fn find_by_target(
        &self,
        event_id: &str,
        created_by: &str,
    ) -> Result<Option<ShortLink>> {
        Ok(self
            .links
            .iter()
            .find(|entry| {
                entry.target_event_id == event_id && entry.created_by == created_by
            })
            .map(|entry| entry.clone()))
    }

    async fn create(&self, link: ShortLink) -> Result<ShortLink> {
        match self.links.entry(link.key.clone()) {
            Entry::Occupied(_) => Err(EvlinkError::duplicate_key(format!(
                "key '{}' already exists",
                link.key
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn mark_expired(&self, key: &str) -> Result<()> {
        match self.links.get_mut(key) {
            Some(mut entry) => {
                entry.is_expired = true;
                Ok(())
            }
            None => {
                debug!(key, "mark_expired on unknown key, nothing to do");
                Ok(())
            }
        }
    }
}
