//! Error classification and the standard error response

use crate::error::RelayError;
use crate::taxonomy::ErrorKind;
use crate::types::Platform;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// Wait suggested to the user when a platform throttles without a hint
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Terminal description of a failed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(serialize_with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub retryable: bool,
    #[serde(skip)]
    pub retry_after: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

fn iso8601<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Error envelope returned to callers crossing the runtime boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: ErrorRecord,
    pub retry_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<ErrorRecord> for ErrorResponse {
    fn from(record: ErrorRecord) -> Self {
        Self {
            status: "error",
            retry_allowed: record.retryable,
            retry_after: record.retry_after.map(|d| d.as_secs()),
            error: record,
        }
    }
}

impl ErrorResponse {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": "error",
                "error": {"code": ErrorKind::UnknownError.code(), "message": e.to_string()},
                "retry_allowed": false,
            })
        })
    }
}

/// Maps any [`RelayError`] onto the taxonomy
///
/// Classification is pure: it never logs and never looks at anything but the
/// error. The retry strategy and the user-facing record both go through
/// [`ErrorHandler::classify`].
pub struct ErrorHandler;

impl ErrorHandler {
    pub fn classify(error: &RelayError) -> ErrorKind {
        match error {
            RelayError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            RelayError::UnknownPlatform(_) => ErrorKind::InvalidPlatform,
            RelayError::TokenExpired { .. } => ErrorKind::TokenExpired,
            RelayError::TokenInvalid { .. } => ErrorKind::TokenInvalid,
            RelayError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            RelayError::RateLimited { .. } => ErrorKind::RateLimit,
            RelayError::PlatformService { .. } => ErrorKind::PlatformServiceError,
            RelayError::PlatformTimeout { .. } => ErrorKind::PlatformTimeout,
            RelayError::InsufficientBudget { .. } => ErrorKind::BudgetInsufficient,
            RelayError::CreativeRejected { .. } => ErrorKind::CreativeRejected,
            RelayError::MissingDependency(_) => ErrorKind::DependencyError,
            RelayError::PersistenceConnection(_) => ErrorKind::McpConnectionError,
            RelayError::PersistenceTimeout(_) => ErrorKind::McpTimeout,
            RelayError::Model(_) => ErrorKind::AiModelFailed,
            RelayError::Retried { source, .. } => Self::classify(source),
            RelayError::BudgetExhausted { .. } => ErrorKind::PlatformTimeout,
            RelayError::Unexpected { .. } => ErrorKind::UnknownError,
        }
    }

    /// Builds the error record for a failure, stamped with the current time
    pub fn handle(error: &RelayError, context: &str, platform: Option<&str>) -> ErrorRecord {
        Self::handle_at(error, context, platform, Utc::now())
    }

    /// Builds the error record for a failure at a given time
    pub fn handle_at(
        error: &RelayError,
        context: &str,
        platform: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> ErrorRecord {
        let kind = Self::classify(error);
        let remediation = kind.remediation();
        let platform = platform
            .map(str::to_string)
            .or_else(|| error.platform().map(|p| p.as_str().to_string()));
        let retry_after = match kind {
            ErrorKind::RateLimit => Some(Self::retry_after(error)),
            _ => None,
        };

        ErrorRecord {
            code: kind.code().to_string(),
            kind,
            message: Self::user_message(error, kind, retry_after),
            context: context.to_string(),
            platform,
            timestamp,
            retryable: kind.is_retryable(),
            retry_after,
            action: Some(remediation.action.to_string()),
            action_url: remediation.action_url.map(str::to_string),
            attempts: error.attempts(),
        }
    }

    fn retry_after(error: &RelayError) -> Duration {
        match error.root() {
            RelayError::RateLimited {
                retry_after: Some(after),
                ..
            } => (*after).max(Duration::from_secs(1)),
            _ => DEFAULT_RETRY_AFTER,
        }
    }

    fn platform_name(error: &RelayError) -> &'static str {
        error
            .platform()
            .map(|p: Platform| p.display_name())
            .unwrap_or("The advertising platform")
    }

    /// User-facing text; never the raw error message
    fn user_message(error: &RelayError, kind: ErrorKind, retry_after: Option<Duration>) -> String {
        let name = Self::platform_name(error);
        match kind {
            ErrorKind::InvalidRequest => match error.root() {
                RelayError::InvalidRequest { reason, .. } => {
                    format!("The request could not be processed: {}.", reason)
                }
                _ => "The request could not be processed.".to_string(),
            },
            ErrorKind::InvalidPlatform => match error.root() {
                RelayError::UnknownPlatform(id) => {
                    format!("'{}' is not a supported advertising platform.", id)
                }
                _ => "This advertising platform is not supported.".to_string(),
            },
            ErrorKind::RateLimit => format!(
                "{} is receiving too many requests. Please wait {} seconds and try again.",
                name,
                retry_after.unwrap_or(DEFAULT_RETRY_AFTER).as_secs()
            ),
            ErrorKind::PlatformServiceError => format!(
                "{} is temporarily unavailable. Please try again in a few minutes.",
                name
            ),
            ErrorKind::PlatformTimeout => {
                format!("{} took too long to respond. Please try again.", name)
            }
            ErrorKind::DependencyError => match error.root() {
                RelayError::MissingDependency(what) => format!(
                    "{} is not configured. Please complete the integration setup.",
                    what
                ),
                _ => "A required integration is not configured.".to_string(),
            },
            ErrorKind::McpConnectionError => {
                "Our data service is temporarily unreachable. Please try again shortly."
                    .to_string()
            }
            ErrorKind::McpTimeout => {
                "Our data service took too long to respond. Please try again.".to_string()
            }
            ErrorKind::AiModelFailed => {
                "Content generation failed. Please try again.".to_string()
            }
            ErrorKind::TokenExpired => format!(
                "Your {} connection has expired. Please reconnect your account.",
                name
            ),
            ErrorKind::TokenInvalid => format!(
                "Your {} connection is no longer valid. Please reconnect your account.",
                name
            ),
            ErrorKind::PermissionDenied => format!(
                "This account does not have permission to perform this action on {}. Please grant the required access.",
                name
            ),
            ErrorKind::BudgetInsufficient => format!(
                "Your {} ad account does not have enough funds. Please add funds or lower the budget.",
                name
            ),
            ErrorKind::CreativeRejected => format!(
                "{} rejected the ad creative. Please review it against the platform's ad policies.",
                name
            ),
            ErrorKind::UnknownError => {
                "An unexpected error occurred. Please contact support if this persists."
                    .to_string()
            }
        }
    }

    /// Builds the error response for a failure
    pub fn respond(error: &RelayError, context: &str, platform: Option<&str>) -> ErrorResponse {
        Self::handle(error, context, platform).into()
    }
}
