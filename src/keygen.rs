//! Random key generation with bounded collision retry.
//!
//! Generation only reads from the store; the write and its unique constraint
//! happen later in the creation path.

use std::iter;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{EvlinkError, Result};
use crate::storage::LinkStore;

/// 62-symbol key alphabet: digits plus both letter cases.
pub const KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Shortest and longest key any component may produce or accept.
pub const KEY_MIN_LENGTH: usize = 3;
pub const KEY_MAX_LENGTH: usize = 16;

/// Produces uniformly distributed fixed-alphabet strings.
pub trait RandomKeySource: Send + Sync {
    /// Uniform length in the closed range.
    fn pick_length(&self, min: usize, max: usize) -> usize;

    /// Uniform random string of the given length from `KEY_ALPHABET`.
    fn draw(&self, length: usize) -> String;
}

/// Thread-rng backed source used in production wiring.
#[derive(Debug, Default)]
pub struct ThreadRngKeySource;

impl ThreadRngKeySource {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn RandomKeySource> {
        Arc::new(Self::new())
    }
}

impl RandomKeySource for ThreadRngKeySource {
    fn pick_length(&self, min: usize, max: usize) -> usize {
        rand::random_range(min..=max)
    }

    fn draw(&self, length: usize) -> String {
        iter::repeat_with(|| KEY_ALPHABET[rand::random_range(0..KEY_ALPHABET.len())] as char)
            .take(length)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyGenOptions {
    pub min_length: usize,
    pub max_length: usize,
    /// Hard ceiling on retries; repeated collisions signal a shrinking
    /// namespace and must never loop unboundedly.
    pub max_collision_retries: usize,
}

impl Default for KeyGenOptions {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 8,
            max_collision_retries: 5,
        }
    }
}

impl KeyGenOptions {
    pub fn validate(&self) -> Result<()> {
        if self.min_length < KEY_MIN_LENGTH || self.max_length > KEY_MAX_LENGTH {
            return Err(EvlinkError::configuration(format!(
                "key lengths must stay within {}-{}, got {}-{}",
                KEY_MIN_LENGTH, KEY_MAX_LENGTH, self.min_length, self.max_length
            )));
        }
        if self.min_length > self.max_length {
            return Err(EvlinkError::configuration(format!(
                "min_length {} exceeds max_length {}",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

/// Mints a globally unique key via bounded retry against the store.
pub struct KeyGenerator {
    source: Arc<dyn RandomKeySource>,
    store: Arc<dyn LinkStore>,
    options: KeyGenOptions,
}

impl KeyGenerator {
    pub fn new(
        source: Arc<dyn RandomKeySource>,
        store: Arc<dyn LinkStore>,
        options: KeyGenOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            source,
            store,
            options,
        })
    }

    pub fn options(&self) -> &KeyGenOptions {
        &self.options
    }

    /// Draw candidates until one is free at the store, up to
    /// `max_collision_retries + 1` attempts. First success wins; uniqueness
    /// is independently enforced by the store's constraint at write time.
    pub async fn generate(&self) -> Result<String> {
        let opts = &self.options;
        for attempt in 0..=opts.max_collision_retries {
            let length = self.source.pick_length(opts.min_length, opts.max_length);
            let candidate = self.source.draw(length);

            if self.store.find_by_key(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            debug!(%candidate, attempt, "generated key collided, retrying");
        }

        Err(EvlinkError::generation_exhausted(
            opts.min_length,
            opts.max_length,
            opts.max_collision_retries + 1,
        ))
    }
}
