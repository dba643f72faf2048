//! Bounded retry with exponential backoff

use crate::error::RetryError;
use crate::timeout::{with_timeout, DEFAULT_TIMEOUT};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    /// Returns true if the failure is transient
    fn is_retryable(&self) -> bool;
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,
    /// Delay before the first retry
    base_delay: Duration,
    /// Multiplier applied to the delay for each further retry
    backoff_factor: u32,
    /// Upper bound for a single attempt
    attempt_timeout: Duration,
    /// Budget for the whole sequence, sleeps included
    timeout: Duration,
}

impl RetryPolicy {
    /// Creates a new retry policy
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2,
            attempt_timeout: DEFAULT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the delay before the first retry
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the backoff multiplier
    pub fn with_backoff_factor(mut self, factor: u32) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Sets the per-attempt timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the total time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay slept after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        self.base_delay
            .saturating_mul(self.backoff_factor.saturating_pow(attempt - 1))
    }

    /// Maximum number of executions, the first attempt included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_factor(&self) -> u32 {
        self.backoff_factor
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Successful result of a retry sequence
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T> {
    pub value: T,
    /// Executions made, including the successful one
    pub attempts: u32,
    /// Wall time spent, backoff included
    pub elapsed: Duration,
}

/// Executes an async operation under a retry policy
///
/// The operation runs at most `max_retries + 1` times. Each attempt is cut off
/// at the smaller of the per-attempt timeout and what is left of the total
/// budget. Non-retryable errors end the sequence after the attempt that
/// produced them.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    context: &str,
    mut operation: F,
) -> Result<RetryOutcome<T>, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts();
    let mut last_error: Option<E> = None;

    for attempt in 1..=max_attempts {
        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            log::warn!(
                "{}: time budget of {:?} spent before attempt {}",
                context,
                policy.timeout,
                attempt
            );
            return Err(RetryError::TimedOut {
                context: context.to_string(),
                attempts: attempt - 1,
                budget: policy.timeout,
                last_error,
            });
        }

        let limit = policy.attempt_timeout.min(policy.timeout - elapsed);
        log::debug!("{}: attempt {}/{}", context, attempt, max_attempts);

        match with_timeout(limit, operation()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    log::info!("{}: succeeded on attempt {}", context, attempt);
                }
                return Ok(RetryOutcome {
                    value,
                    attempts: attempt,
                    elapsed: started.elapsed(),
                });
            }
            Ok(Err(error)) => {
                if !error.is_retryable() || attempt == max_attempts {
                    return Err(RetryError::Failed {
                        context: context.to_string(),
                        attempts: attempt,
                        error,
                    });
                }
                log::warn!("{}: attempt {} failed: {}", context, attempt, error);
                last_error = Some(error);
            }
            Err(_) => {
                log::warn!("{}: attempt {} timed out after {:?}", context, attempt, limit);
                if attempt == max_attempts {
                    return Err(RetryError::TimedOut {
                        context: context.to_string(),
                        attempts: attempt,
                        budget: policy.timeout,
                        last_error: None,
                    });
                }
                last_error = None;
            }
        }

        // Never sleep past the budget; the check at the top of the loop ends it.
        let remaining = policy.timeout.saturating_sub(started.elapsed());
        let delay = policy.delay_for_attempt(attempt).min(remaining);
        tokio::time::sleep(delay).await;
    }

    Err(RetryError::TimedOut {
        context: context.to_string(),
        attempts: max_attempts,
        budget: policy.timeout,
        last_error,
    })
}
