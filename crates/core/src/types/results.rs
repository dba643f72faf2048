//! Results returned by platform adapters

use super::{Budget, Platform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery state of a campaign, ad set or ad, normalized across platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Active,
    Paused,
    PendingReview,
    Deleted,
    Unknown,
}

impl DeliveryStatus {
    /// Maps a platform's native status string
    pub fn from_platform(platform: Platform, raw: &str) -> Self {
        let raw = raw.trim().to_ascii_uppercase();
        match platform {
            Platform::Meta => match raw.as_str() {
                "ACTIVE" => Self::Active,
                "PAUSED" | "CAMPAIGN_PAUSED" | "ADSET_PAUSED" => Self::Paused,
                "IN_PROCESS" | "PENDING_REVIEW" | "PREAPPROVED" => Self::PendingReview,
                "DELETED" | "ARCHIVED" => Self::Deleted,
                _ => Self::Unknown,
            },
            Platform::TikTok => match raw.as_str() {
                "ENABLE" | "CAMPAIGN_STATUS_ENABLE" => Self::Active,
                "DISABLE" | "CAMPAIGN_STATUS_DISABLE" => Self::Paused,
                "DELETE" | "CAMPAIGN_STATUS_DELETE" => Self::Deleted,
                "CAMPAIGN_STATUS_NOT_DELETE" => Self::Unknown,
                s if s.contains("AUDIT") => Self::PendingReview,
                _ => Self::Unknown,
            },
            Platform::Google => match raw.as_str() {
                "ENABLED" | "ELIGIBLE" => Self::Active,
                "PAUSED" => Self::Paused,
                "PENDING" | "UNDER_REVIEW" => Self::PendingReview,
                "REMOVED" => Self::Deleted,
                _ => Self::Unknown,
            },
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Active => write!(f, "active"),
            DeliveryStatus::Paused => write!(f, "paused"),
            DeliveryStatus::PendingReview => write!(f, "pending_review"),
            DeliveryStatus::Deleted => write!(f, "deleted"),
            DeliveryStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignResult {
    pub platform: Platform,
    pub campaign_id: String,
    pub name: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsetResult {
    pub platform: Platform,
    pub adset_id: String,
    pub campaign_id: String,
    pub name: String,
    pub budget: Option<Budget>,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdResult {
    pub platform: Platform,
    pub ad_id: String,
    pub adset_id: String,
    pub name: String,
    pub status: DeliveryStatus,
}

/// Result of a state-changing call on an existing object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub platform: Platform,
    pub object_id: String,
    pub action: String,
    pub success: bool,
}

impl ActionResult {
    pub fn succeeded(platform: Platform, object_id: impl Into<String>, action: &str) -> Self {
        Self {
            platform,
            object_id: object_id.into(),
            action: action.to_string(),
            success: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResult {
    pub platform: Platform,
    pub campaign_id: String,
    pub status: DeliveryStatus,
    /// Status string exactly as the platform reported it
    pub platform_status: String,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_statuses() {
        assert_eq!(DeliveryStatus::from_platform(Platform::Meta, "ACTIVE"), DeliveryStatus::Active);
        assert_eq!(
            DeliveryStatus::from_platform(Platform::Meta, "archived"),
            DeliveryStatus::Deleted
        );
        assert_eq!(
            DeliveryStatus::from_platform(Platform::Meta, "IN_PROCESS"),
            DeliveryStatus::PendingReview
        );
    }

    #[test]
    fn test_tiktok_statuses() {
        assert_eq!(
            DeliveryStatus::from_platform(Platform::TikTok, "CAMPAIGN_STATUS_DISABLE"),
            DeliveryStatus::Paused
        );
        assert_eq!(
            DeliveryStatus::from_platform(Platform::TikTok, "AD_STATUS_AUDIT"),
            DeliveryStatus::PendingReview
        );
    }

    #[test]
    fn test_google_statuses() {
        assert_eq!(
            DeliveryStatus::from_platform(Platform::Google, "ENABLED"),
            DeliveryStatus::Active
        );
        assert_eq!(
            DeliveryStatus::from_platform(Platform::Google, "REMOVED"),
            DeliveryStatus::Deleted
        );
        assert_eq!(DeliveryStatus::from_platform(Platform::Google, "???"), DeliveryStatus::Unknown);
    }

    #[test]
    fn test_status_result_serde() {
        let status = StatusResult {
            platform: Platform::Meta,
            campaign_id: "123".to_string(),
            status: DeliveryStatus::PendingReview,
            platform_status: "IN_PROCESS".to_string(),
            name: None,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "pending_review");
        let back: StatusResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, status);
    }
}
