//! Configuration loading and validation.
//!
//! Defaults-first: a fully populated `EvlinkConfig::default()` is layered
//! under an optional `evlink.toml` file and `EVLINK__*` environment
//! variables (`EVLINK__CACHE__TTL_MS=5000`,
//! `EVLINK__CUSTOM_KEYS__RESERVED=health,metrics`).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::errors::{EvlinkError, Result};
use crate::keygen::{KEY_MAX_LENGTH, KEY_MIN_LENGTH, KeyGenOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub max_collision_retries: usize,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 8,
            max_collision_retries: 5,
        }
    }
}

impl From<&KeygenConfig> for KeyGenOptions {
    fn from(config: &KeygenConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            max_collision_retries: config.max_collision_retries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window for resolution snapshots.
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomKeyConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Words that would shadow operational path segments.
    pub reserved: Vec<String>,
}

impl Default for CustomKeyConfig {
    fn default() -> Self {
        Self {
            min_length: KEY_MIN_LENGTH,
            max_length: KEY_MAX_LENGTH,
            reserved: [
                "health", "metrics", "api", "admin", "static", "assets", "events", "register",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryConfig {
    /// Grace added to the target event's end time when deriving
    /// `expires_at`.
    pub grace_secs: u64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self { grace_secs: 86_400 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvlinkConfig {
    pub keygen: KeygenConfig,
    pub cache: CacheConfig,
    pub custom_keys: CustomKeyConfig,
    pub expiry: ExpiryConfig,
}

impl EvlinkConfig {
    /// Load defaults, then `evlink.toml` if present, then environment
    /// overrides, and validate the result.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::try_from(&EvlinkConfig::default())
            .map_err(|e| EvlinkError::configuration(e.to_string()))?;

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("evlink").required(false))
            .add_source(
                Environment::with_prefix("EVLINK")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("custom_keys.reserved"),
            )
            .build()
            .map_err(|e| EvlinkError::configuration(e.to_string()))?;

        let config: EvlinkConfig = merged
            .try_deserialize()
            .map_err(|e| EvlinkError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        KeyGenOptions::from(&self.keygen).validate()?;

        if self.cache.ttl_ms == 0 {
            return Err(EvlinkError::configuration("cache.ttl_ms must be positive"));
        }
        if self.custom_keys.min_length < KEY_MIN_LENGTH
            || self.custom_keys.max_length > KEY_MAX_LENGTH
            || self.custom_keys.min_length > self.custom_keys.max_length
        {
            return Err(EvlinkError::configuration(format!(
                "custom key bounds {}-{} must stay within {}-{}",
                self.custom_keys.min_length,
                self.custom_keys.max_length,
                KEY_MIN_LENGTH,
                KEY_MAX_LENGTH
            )));
        }
        Ok(())
    }
}
