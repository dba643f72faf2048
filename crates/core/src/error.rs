//! Error type carried through every adrelay layer
//!
//! `RelayError` describes *what* went wrong in terms the runtime can act on.
//! It is deliberately close to the failures the collaborators raise:
//! - **Request** errors: missing or malformed parameters, unknown platform
//! - **Platform** errors: auth, rate limits, outages, account and policy problems
//! - **Collaborator** errors: persistence, AI generation, missing integrations
//! - **Sequence** errors: retry exhaustion and spent time budgets
//!
//! Turning an error into something shown to a user is the job of
//! [`ErrorHandler`](crate::ErrorHandler), which maps every variant onto the
//! closed [`ErrorKind`](crate::ErrorKind) taxonomy.

use crate::handler::ErrorHandler;
use crate::types::Platform;
use adrelay_resilience::{RetryError, Retryable};
use std::time::Duration;
use thiserror::Error;

/// Convenience type alias for results using RelayError
pub type RelayResult<T> = std::result::Result<T, RelayError>;

/// Main error type for adrelay
#[derive(Error, Debug)]
pub enum RelayError {
    // ===== Request Errors =====
    /// Missing or malformed request parameters
    #[error("Invalid request for {operation}: {reason}")]
    InvalidRequest { operation: String, reason: String },

    /// Platform identifier with no registered adapter
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    // ===== Platform Errors =====
    /// Access token past its expiry
    #[error("{platform} access token expired")]
    TokenExpired { platform: Platform },

    /// Access token revoked or malformed
    #[error("{platform} access token invalid: {message}")]
    TokenInvalid { platform: Platform, message: String },

    /// Token lacks the scope or role for the call
    #[error("Permission denied by {platform}: {message}")]
    PermissionDenied { platform: Platform, message: String },

    /// Platform throttled the caller
    #[error("{platform} rate limit reached")]
    RateLimited {
        platform: Platform,
        retry_after: Option<Duration>,
    },

    /// Platform-side failure (5xx, connection reset, transient API error)
    #[error("{platform} service error (status {status:?}): {message}")]
    PlatformService {
        platform: Platform,
        status: Option<u16>,
        message: String,
    },

    /// Platform did not answer in time
    #[error("{platform} did not respond within {after:?}")]
    PlatformTimeout { platform: Platform, after: Duration },

    /// Ad account cannot fund the requested spend
    #[error("Insufficient budget on {platform}: {message}")]
    InsufficientBudget { platform: Platform, message: String },

    /// Creative refused by platform review
    #[error("Creative rejected by {platform}: {reason}")]
    CreativeRejected { platform: Platform, reason: String },

    // ===== Collaborator Errors =====
    /// Required integration or credential is not configured
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// Persistence service unreachable
    #[error("Persistence connection failed: {0}")]
    PersistenceConnection(String),

    /// Persistence service too slow
    #[error("Persistence call timed out after {0:?}")]
    PersistenceTimeout(Duration),

    /// Upstream AI model failed to produce output
    #[error("AI model failed: {0}")]
    Model(String),

    // ===== Sequence Errors =====
    /// Operation still failing after more than one attempt
    #[error("{context} failed after {attempts} attempts: {source}")]
    Retried {
        context: String,
        attempts: u32,
        #[source]
        source: Box<RelayError>,
    },

    /// Retry sequence ran out of time
    #[error("{context} exceeded its {budget:?} time budget after {attempts} attempt(s)")]
    BudgetExhausted {
        context: String,
        attempts: u32,
        budget: Duration,
        #[source]
        last_error: Option<Box<RelayError>>,
    },

    // ===== Generic Errors =====
    /// Anything the taxonomy does not recognize
    #[error("Unexpected error: {message}")]
    Unexpected {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RelayError {
    /// Helper for a required parameter that is absent
    pub fn missing_field(operation: &str, field: &str) -> Self {
        Self::InvalidRequest {
            operation: operation.to_string(),
            reason: format!("missing required field '{}'", field),
        }
    }

    /// Helper to wrap any foreign error as unexpected
    pub fn unexpected<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Platform the failure originated from, if any
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Self::TokenExpired { platform }
            | Self::TokenInvalid { platform, .. }
            | Self::PermissionDenied { platform, .. }
            | Self::RateLimited { platform, .. }
            | Self::PlatformService { platform, .. }
            | Self::PlatformTimeout { platform, .. }
            | Self::InsufficientBudget { platform, .. }
            | Self::CreativeRejected { platform, .. } => Some(*platform),
            Self::Retried { source, .. } => source.platform(),
            Self::BudgetExhausted { last_error, .. } => {
                last_error.as_ref().and_then(|e| e.platform())
            }
            _ => None,
        }
    }

    /// Executions made when the error came out of a retry sequence
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Retried { attempts, .. } | Self::BudgetExhausted { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }

    /// The failure behind any retry bookkeeping
    pub fn root(&self) -> &RelayError {
        match self {
            Self::Retried { source, .. } => source.root(),
            _ => self,
        }
    }
}

impl Retryable for RelayError {
    fn is_retryable(&self) -> bool {
        ErrorHandler::classify(self).is_retryable()
    }
}

impl From<RetryError<RelayError>> for RelayError {
    fn from(err: RetryError<RelayError>) -> Self {
        match err {
            RetryError::Failed {
                attempts: 1,
                error,
                ..
            } => error,
            RetryError::Failed {
                context,
                attempts,
                error,
            } => Self::Retried {
                context,
                attempts,
                source: Box::new(error),
            },
            RetryError::TimedOut {
                context,
                attempts,
                budget,
                last_error,
            } => Self::BudgetExhausted {
                context,
                attempts,
                budget,
                last_error: last_error.map(Box::new),
            },
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected("JSON encoding failed", err)
    }
}
