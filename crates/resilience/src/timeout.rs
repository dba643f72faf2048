//! Timeout handling utilities

use crate::error::{ResilienceError, ResilienceResult};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

/// Timeout applied to every category unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a future, failing if it does not complete within `duration`
pub async fn with_timeout<F, T>(duration: Duration, operation: F) -> ResilienceResult<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, operation)
        .await
        .map_err(|_| ResilienceError::Timeout(duration))
}

/// Kind of upstream call a timeout applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutCategory {
    /// Advertising platform API call
    ApiCall,
    /// Persistence service call
    McpCall,
    /// AI text generation
    AiGeneration,
    /// Anything else
    Default,
}

impl TimeoutCategory {
    pub const ALL: [TimeoutCategory; 4] = [
        TimeoutCategory::ApiCall,
        TimeoutCategory::McpCall,
        TimeoutCategory::AiGeneration,
        TimeoutCategory::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeoutCategory::ApiCall => "api_call",
            TimeoutCategory::McpCall => "mcp_call",
            TimeoutCategory::AiGeneration => "ai_generation",
            TimeoutCategory::Default => "default",
        }
    }
}

impl fmt::Display for TimeoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeoutCategory {
    type Err = std::convert::Infallible;

    /// Unknown categories resolve to [`TimeoutCategory::Default`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "api_call" => TimeoutCategory::ApiCall,
            "mcp_call" => TimeoutCategory::McpCall,
            "ai_generation" => TimeoutCategory::AiGeneration,
            _ => TimeoutCategory::Default,
        })
    }
}

/// Static mapping from call category to timeout
///
/// The stock policy is flat: every category gets the same duration, so
/// callers see identical behavior regardless of which platform they hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    api_call: Duration,
    mcp_call: Duration,
    ai_generation: Duration,
    default: Duration,
}

impl TimeoutConfig {
    /// Creates a config using one duration for every category
    pub fn flat(duration: Duration) -> Self {
        Self {
            api_call: duration,
            mcp_call: duration,
            ai_generation: duration,
            default: duration,
        }
    }

    /// Overrides the timeout for a single category
    pub fn with_category(mut self, category: TimeoutCategory, duration: Duration) -> Self {
        match category {
            TimeoutCategory::ApiCall => self.api_call = duration,
            TimeoutCategory::McpCall => self.mcp_call = duration,
            TimeoutCategory::AiGeneration => self.ai_generation = duration,
            TimeoutCategory::Default => self.default = duration,
        }
        self
    }

    /// Returns the timeout for a category
    pub fn get_timeout(&self, category: TimeoutCategory) -> Duration {
        match category {
            TimeoutCategory::ApiCall => self.api_call,
            TimeoutCategory::McpCall => self.mcp_call,
            TimeoutCategory::AiGeneration => self.ai_generation,
            TimeoutCategory::Default => self.default,
        }
    }

    /// Returns the timeout for a category given by name
    pub fn timeout_for(&self, category: &str) -> Duration {
        let category = category.parse().unwrap_or(TimeoutCategory::Default);
        self.get_timeout(category)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::flat(DEFAULT_TIMEOUT)
    }
}
