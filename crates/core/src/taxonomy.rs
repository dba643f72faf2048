//! Closed error taxonomy
//!
//! Every failure that crosses the runtime boundary is reported as one of these
//! kinds. Codes are grouped by origin: 1xxx request, 4xxx platform
//! availability, 5xxx collaborators, 6xxx account state, 9999 catch-all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidRequest,
    InvalidPlatform,
    RateLimit,
    PlatformServiceError,
    PlatformTimeout,
    DependencyError,
    McpConnectionError,
    McpTimeout,
    AiModelFailed,
    TokenExpired,
    TokenInvalid,
    PermissionDenied,
    BudgetInsufficient,
    CreativeRejected,
    UnknownError,
}

/// Suggested next step for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remediation {
    pub action: &'static str,
    pub action_url: Option<&'static str>,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 15] = [
        ErrorKind::InvalidRequest,
        ErrorKind::InvalidPlatform,
        ErrorKind::RateLimit,
        ErrorKind::PlatformServiceError,
        ErrorKind::PlatformTimeout,
        ErrorKind::DependencyError,
        ErrorKind::McpConnectionError,
        ErrorKind::McpTimeout,
        ErrorKind::AiModelFailed,
        ErrorKind::TokenExpired,
        ErrorKind::TokenInvalid,
        ErrorKind::PermissionDenied,
        ErrorKind::BudgetInsufficient,
        ErrorKind::CreativeRejected,
        ErrorKind::UnknownError,
    ];

    /// Numeric taxonomy id
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "1001",
            Self::InvalidPlatform => "1002",
            Self::RateLimit => "1003",
            Self::PlatformServiceError | Self::PlatformTimeout => "4002",
            Self::DependencyError => "5001",
            Self::McpConnectionError => "5002",
            Self::McpTimeout => "5003",
            Self::AiModelFailed => "5004",
            Self::TokenExpired | Self::TokenInvalid | Self::PermissionDenied => "6001",
            Self::BudgetInsufficient => "6002",
            Self::CreativeRejected => "6003",
            Self::UnknownError => "9999",
        }
    }

    /// Tag used in the `type` field of error responses
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidPlatform => "INVALID_PLATFORM",
            Self::RateLimit => "RATE_LIMIT",
            Self::PlatformServiceError => "PLATFORM_SERVICE_ERROR",
            Self::PlatformTimeout => "PLATFORM_TIMEOUT",
            Self::DependencyError => "DEPENDENCY_ERROR",
            Self::McpConnectionError => "MCP_CONNECTION_ERROR",
            Self::McpTimeout => "MCP_TIMEOUT",
            Self::AiModelFailed => "AI_MODEL_FAILED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::BudgetInsufficient => "BUDGET_INSUFFICIENT",
            Self::CreativeRejected => "CREATIVE_REJECTED",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Transient kinds that the retry strategy may repeat
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit
                | Self::PlatformServiceError
                | Self::PlatformTimeout
                | Self::McpConnectionError
                | Self::McpTimeout
                | Self::AiModelFailed
        )
    }

    /// Kinds that need the user to reconnect or grant access
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            Self::TokenExpired | Self::TokenInvalid | Self::PermissionDenied
        )
    }

    pub fn remediation(&self) -> Remediation {
        let (action, action_url) = match self {
            Self::InvalidRequest => ("fix_request", None),
            Self::InvalidPlatform => ("choose_supported_platform", Some("/settings/integrations")),
            Self::RateLimit => ("wait_and_retry", None),
            Self::PlatformServiceError | Self::PlatformTimeout => ("retry_later", None),
            Self::DependencyError => ("configure_integration", Some("/settings/integrations")),
            Self::McpConnectionError | Self::McpTimeout | Self::AiModelFailed => {
                ("retry_later", None)
            }
            Self::TokenExpired | Self::TokenInvalid => {
                ("reconnect_account", Some("/settings/integrations"))
            }
            Self::PermissionDenied => ("grant_permissions", Some("/settings/integrations")),
            Self::BudgetInsufficient => ("add_funds", Some("/billing")),
            Self::CreativeRejected => ("edit_creative", Some("/campaigns")),
            Self::UnknownError => ("contact_support", Some("/support")),
        };
        Remediation { action, action_url }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    /// Parses a type tag, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.type_tag() == tag)
            .ok_or_else(|| format!("unknown error type '{}'", s))
    }
}
