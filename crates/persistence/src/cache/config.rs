//! Cache configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Expiry and size limits for one entity type's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time an entry stays valid after it is written.
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Maximum number of entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

fn default_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_max_entries() -> u64 {
    100
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

/// Cache settings for every entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Policy for entity types without an override.
    #[serde(default, flatten)]
    pub default: CachePolicy,

    /// Per-entity overrides keyed by entity name (e.g. `plateHistory`).
    #[serde(default)]
    pub entities: HashMap<String, CachePolicy>,
}

impl CacheConfig {
    /// Creates a config applying one policy to every entity type.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            default: CachePolicy { ttl, max_entries },
            entities: HashMap::new(),
        }
    }

    /// Overrides the policy of one entity type.
    pub fn with_policy(mut self, entity: impl Into<String>, policy: CachePolicy) -> Self {
        self.entities.insert(entity.into(), policy);
        self
    }

    /// Returns the policy for an entity type.
    pub fn policy_for(&self, entity: &str) -> CachePolicy {
        self.entities.get(entity).copied().unwrap_or(self.default)
    }
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
