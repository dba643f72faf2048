//! Retry configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use adrelay_resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry behaviour for platform and persistence calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (0-10)
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay after each retry (1-10)
    pub backoff_factor: u32,

    /// Time budget for a whole retry sequence, in seconds
    pub total_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2,
            total_timeout_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Builds the policy used by the router
    ///
    /// The per-attempt bound is taken from the timeouts section when the
    /// router is built.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_backoff_factor(self.backoff_factor)
            .with_timeout(Duration::from_secs(self.total_timeout_secs))
    }
}

impl ConfigSection for RetryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.max_retries, 0, 10, "retry.max_retries"),
            Validator::in_range(self.base_delay_ms, 1, 60_000, "retry.base_delay_ms"),
            Validator::in_range(self.backoff_factor, 1, 10, "retry.backoff_factor"),
            Validator::in_range(self.total_timeout_secs, 1, 3_600, "retry.total_timeout_secs"),
        ])
    }

    fn section_name(&self) -> &'static str {
        "retry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RetryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_matches_stock_policy() {
        let policy = RetryConfig::default().to_policy();
        let stock = RetryPolicy::default();
        assert_eq!(policy.max_retries(), stock.max_retries());
        assert_eq!(policy.base_delay(), stock.base_delay());
        assert_eq!(policy.backoff_factor(), stock.backoff_factor());
        assert_eq!(policy.timeout(), stock.timeout());
    }

    #[test]
    fn test_to_policy() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 250,
            backoff_factor: 3,
            total_timeout_secs: 90,
        };
        let policy = config.to_policy();
        assert_eq!(policy.max_attempts(), 6);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(750));
        assert_eq!(policy.timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_zero_factor_rejected() {
        let config = RetryConfig {
            backoff_factor: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = RetryConfig {
            max_retries: 11,
            base_delay_ms: 0,
            backoff_factor: 2,
            total_timeout_secs: 0,
        };
        assert_eq!(config.validate().unwrap_err().len(), 3);
    }
}
