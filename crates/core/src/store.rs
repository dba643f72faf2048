//! Persistence contract for campaign records
//!
//! The runtime never talks to a database itself. Whatever keeps campaign
//! records is injected as a [`CampaignStore`] and reports its failures as
//! [`RelayError::PersistenceConnection`] or [`RelayError::PersistenceTimeout`].

use crate::error::{RelayError, RelayResult};
use crate::types::{Budget, DeliveryStatus, Parameters, Platform};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// A campaign as the persistence layer keeps it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    /// Platform-assigned campaign id
    pub campaign_id: String,
    pub platform: Platform,
    pub name: String,
    pub status: DeliveryStatus,
    pub budget: Option<Budget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Free-form attributes supplied with the create call
    #[serde(default)]
    pub attributes: Parameters,
}

impl CampaignRecord {
    pub fn new(
        platform: Platform,
        campaign_id: impl Into<String>,
        name: impl Into<String>,
        status: DeliveryStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            campaign_id: campaign_id.into(),
            platform,
            name: name.into(),
            status,
            budget: None,
            created_at: now,
            updated_at: now,
            attributes: Parameters::new(),
        }
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_attributes(mut self, attributes: Parameters) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Partial change to an existing campaign record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub status: Option<DeliveryStatus>,
    pub budget: Option<Budget>,
    pub name: Option<String>,
}

impl CampaignUpdate {
    pub fn status(status: DeliveryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn budget(budget: Budget) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.budget.is_none() && self.name.is_none()
    }

    fn apply(&self, record: &mut CampaignRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(budget) = self.budget {
            record.budget = Some(budget);
        }
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        record.updated_at = Utc::now();
    }
}

/// Persistence client for campaign records
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Stores a newly created campaign
    async fn create_campaign(&self, record: CampaignRecord) -> RelayResult<CampaignRecord>;

    /// Applies a change to a stored campaign and returns the new record
    async fn update_campaign(
        &self,
        platform: Platform,
        campaign_id: &str,
        update: CampaignUpdate,
    ) -> RelayResult<CampaignRecord>;

    /// Looks up a campaign, `None` if it was never stored
    async fn fetch_campaign(
        &self,
        platform: Platform,
        campaign_id: &str,
    ) -> RelayResult<Option<CampaignRecord>>;
}

/// Process-local [`CampaignStore`] used by the CLI and tests
#[derive(Debug, Default)]
pub struct MemoryCampaignStore {
    records: Mutex<HashMap<(Platform, String), CampaignRecord>>,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> RelayResult<std::sync::MutexGuard<'_, HashMap<(Platform, String), CampaignRecord>>> {
        self.records
            .lock()
            .map_err(|_| RelayError::PersistenceConnection("campaign store poisoned".into()))
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn create_campaign(&self, record: CampaignRecord) -> RelayResult<CampaignRecord> {
        let key = (record.platform, record.campaign_id.clone());
        self.lock()?.insert(key, record.clone());
        Ok(record)
    }

    async fn update_campaign(
        &self,
        platform: Platform,
        campaign_id: &str,
        update: CampaignUpdate,
    ) -> RelayResult<CampaignRecord> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(&(platform, campaign_id.to_string()))
            .ok_or_else(|| RelayError::InvalidRequest {
                operation: "update_campaign".to_string(),
                reason: format!("campaign '{}' is not stored", campaign_id),
            })?;
        update.apply(record);
        Ok(record.clone())
    }

    async fn fetch_campaign(
        &self,
        platform: Platform,
        campaign_id: &str,
    ) -> RelayResult<Option<CampaignRecord>> {
        Ok(self
            .lock()?
            .get(&(platform, campaign_id.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_fetch() {
        let store = MemoryCampaignStore::new();
        let record =
            CampaignRecord::new(Platform::Meta, "120210", "Spring Sale", DeliveryStatus::Paused)
                .with_budget(Budget::daily(50.0));
        store.create_campaign(record.clone()).await.unwrap();

        let fetched = store.fetch_campaign(Platform::Meta, "120210").await.unwrap();
        assert_eq!(fetched, Some(record));
        assert!(store
            .fetch_campaign(Platform::TikTok, "120210")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_applies_partial_change() {
        let store = MemoryCampaignStore::new();
        store
            .create_campaign(CampaignRecord::new(
                Platform::Google,
                "987",
                "Search",
                DeliveryStatus::Active,
            ))
            .await
            .unwrap();

        let updated = store
            .update_campaign(
                Platform::Google,
                "987",
                CampaignUpdate::status(DeliveryStatus::Paused),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, DeliveryStatus::Paused);
        assert_eq!(updated.name, "Search");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let store = MemoryCampaignStore::new();
        let err = store
            .update_campaign(Platform::Meta, "404", CampaignUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_update() {
        assert!(CampaignUpdate::default().is_empty());
        assert!(!CampaignUpdate::budget(Budget::lifetime(1000.0)).is_empty());
    }
}
