//! Resilience patterns for upstream calls
//!
//! This crate provides:
//! - Bounded retry with exponential backoff and a retryable-error predicate
//! - A total time budget over the retry sequence plus a per-attempt timeout
//! - A flat category-to-timeout policy
//!
//! # Example
//!
//! ```rust
//! use adrelay_resilience::{RetryPolicy, TimeoutCategory, TimeoutConfig};
//! use std::time::Duration;
//!
//! let timeouts = TimeoutConfig::default();
//! let policy = RetryPolicy::new(3)
//!     .with_base_delay(Duration::from_secs(1))
//!     .with_timeout(timeouts.get_timeout(TimeoutCategory::ApiCall));
//!
//! assert_eq!(policy.max_attempts(), 4);
//! ```

mod error;
mod retry;
mod timeout;

pub use error::{ResilienceError, ResilienceResult, RetryError};
pub use retry::{retry_with_backoff, RetryOutcome, RetryPolicy, Retryable};
pub use timeout::{with_timeout, TimeoutCategory, TimeoutConfig, DEFAULT_TIMEOUT};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: RetryPolicy = RetryPolicy::default();
        let _: TimeoutConfig = TimeoutConfig::default();
        let _: TimeoutCategory = TimeoutCategory::ApiCall;
        let _: ResilienceError = ResilienceError::Timeout(DEFAULT_TIMEOUT);
    }
}
