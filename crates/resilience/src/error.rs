//! Error types for resilience operations

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors raised by the resilience primitives themselves
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Terminal failure of a retry sequence
///
/// Carries the number of attempts actually made so callers can report it,
/// and the error of the last attempt when there was one.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The last attempt failed with a non-retryable error, or the attempt
    /// bound was reached
    Failed {
        context: String,
        attempts: u32,
        error: E,
    },

    /// The time budget ran out before the sequence could finish
    TimedOut {
        context: String,
        attempts: u32,
        budget: Duration,
        last_error: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// Number of times the operation was executed
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Failed { attempts, .. } | RetryError::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Label of the retried operation
    pub fn context(&self) -> &str {
        match self {
            RetryError::Failed { context, .. } | RetryError::TimedOut { context, .. } => context,
        }
    }

    /// Returns true if the sequence ended because its time budget ran out
    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::TimedOut { .. })
    }

    /// Returns the last operation error, if any attempt produced one
    pub fn into_error(self) -> Option<E> {
        match self {
            RetryError::Failed { error, .. } => Some(error),
            RetryError::TimedOut { last_error, .. } => last_error,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Failed {
                context,
                attempts,
                error,
            } => write!(f, "{} failed after {} attempt(s): {}", context, attempts, error),
            RetryError::TimedOut {
                context,
                attempts,
                budget,
                ..
            } => write!(
                f,
                "{} exceeded its {:?} time budget after {} attempt(s)",
                context, budget, attempts
            ),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Failed { error, .. } => Some(error),
            RetryError::TimedOut { last_error, .. } => {
                last_error.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error() {
        let err = ResilienceError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
    }

    #[test]
    fn test_failed_display() {
        let err = RetryError::Failed {
            context: "meta.create_campaign".to_string(),
            attempts: 4,
            error: "connection reset".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("meta.create_campaign"));
        assert!(text.contains("4 attempt"));
        assert!(text.contains("connection reset"));
        assert_eq!(err.attempts(), 4);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timed_out_keeps_last_error() {
        let err = RetryError::TimedOut {
            context: "tiktok.get_status".to_string(),
            attempts: 2,
            budget: Duration::from_secs(30),
            last_error: Some("503".to_string()),
        };
        assert!(err.is_timeout());
        assert_eq!(err.context(), "tiktok.get_status");
        assert!(err.to_string().contains("30s"));
        assert_eq!(err.into_error(), Some("503".to_string()));
    }
}
