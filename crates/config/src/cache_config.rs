//! Cache configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_TTL_SECS: u64 = 86_400;

/// Lifetimes of cached platform reads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window applied when a caller gives no TTL
    pub default_ttl_secs: u64,

    /// Freshness window for campaign status reads
    pub status_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            status_ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }
}

impl ConfigSection for CacheConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.default_ttl_secs, 1, MAX_TTL_SECS, "cache.default_ttl_secs"),
            Validator::in_range(self.status_ttl_secs, 1, MAX_TTL_SECS, "cache.status_ttl_secs"),
        ])
    }

    fn section_name(&self) -> &'static str {
        "cache"
    }
}
