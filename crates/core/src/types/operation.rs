//! Logical operations and requests

use super::Parameters;
use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An operation every platform adapter implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateCampaign,
    CreateAdset,
    CreateAd,
    UpdateBudget,
    PauseAdset,
    ResumeAdset,
    GetStatus,
    DeleteCampaign,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::CreateCampaign,
        Operation::CreateAdset,
        Operation::CreateAd,
        Operation::UpdateBudget,
        Operation::PauseAdset,
        Operation::ResumeAdset,
        Operation::GetStatus,
        Operation::DeleteCampaign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateCampaign => "create_campaign",
            Operation::CreateAdset => "create_adset",
            Operation::CreateAd => "create_ad",
            Operation::UpdateBudget => "update_budget",
            Operation::PauseAdset => "pause_adset",
            Operation::ResumeAdset => "resume_adset",
            Operation::GetStatus => "get_status",
            Operation::DeleteCampaign => "delete_campaign",
        }
    }

    /// Returns true for operations that do not change platform state
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::GetStatus)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| RelayError::InvalidRequest {
                operation: s.to_string(),
                reason: "unsupported operation".to_string(),
            })
    }
}

/// A request to perform one operation on one platform
///
/// `platform` is kept as the caller sent it; the router resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub platform: String,
    pub operation: Operation,
    #[serde(default)]
    pub parameters: Parameters,
}

impl OperationRequest {
    pub fn new(platform: impl Into<String>, operation: Operation, parameters: Parameters) -> Self {
        Self {
            platform: platform.into(),
            operation,
            parameters,
        }
    }

    /// Label used in logs and error records, e.g. `meta.create_campaign`
    pub fn context(&self) -> String {
        format!("{}.{}", self.platform, self.operation)
    }
}
