//! Timeout configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use adrelay_resilience::{TimeoutCategory, TimeoutConfig, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_TIMEOUT_SECS: u64 = 600;

/// Per-category timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Single advertising platform API call
    pub api_call_secs: u64,

    /// Single persistence service call
    pub mcp_call_secs: u64,

    /// AI text generation
    pub ai_generation_secs: u64,

    /// Anything without a category of its own
    pub default_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        let secs = DEFAULT_TIMEOUT.as_secs();
        Self {
            api_call_secs: secs,
            mcp_call_secs: secs,
            ai_generation_secs: secs,
            default_secs: secs,
        }
    }
}

impl TimeoutsConfig {
    pub fn to_timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::flat(Duration::from_secs(self.default_secs))
            .with_category(TimeoutCategory::ApiCall, Duration::from_secs(self.api_call_secs))
            .with_category(TimeoutCategory::McpCall, Duration::from_secs(self.mcp_call_secs))
            .with_category(
                TimeoutCategory::AiGeneration,
                Duration::from_secs(self.ai_generation_secs),
            )
    }
}

impl ConfigSection for TimeoutsConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.api_call_secs, 1, MAX_TIMEOUT_SECS, "timeouts.api_call_secs"),
            Validator::in_range(self.mcp_call_secs, 1, MAX_TIMEOUT_SECS, "timeouts.mcp_call_secs"),
            Validator::in_range(
                self.ai_generation_secs,
                1,
                MAX_TIMEOUT_SECS,
                "timeouts.ai_generation_secs",
            ),
            Validator::in_range(self.default_secs, 1, MAX_TIMEOUT_SECS, "timeouts.default_secs"),
        ])
    }

    fn section_name(&self) -> &'static str {
        "timeouts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_flat() {
        let config = TimeoutsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_timeout_config(), TimeoutConfig::default());
    }

    #[test]
    fn test_categories_are_independent() {
        let config = TimeoutsConfig {
            api_call_secs: 10,
            ai_generation_secs: 120,
            ..Default::default()
        };
        let timeouts = config.to_timeout_config();
        assert_eq!(timeouts.get_timeout(TimeoutCategory::ApiCall), Duration::from_secs(10));
        assert_eq!(timeouts.get_timeout(TimeoutCategory::McpCall), Duration::from_secs(30));
        assert_eq!(timeouts.timeout_for("ai_generation"), Duration::from_secs(120));
        assert_eq!(timeouts.timeout_for("unheard_of"), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = TimeoutsConfig {
            mcp_call_secs: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "timeouts.mcp_call_secs");
    }
}
