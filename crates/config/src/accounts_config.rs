//! Platform account configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Account ids needed by adapters whose calls carry only an object id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccountsConfig {
    /// TikTok advertiser id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok_advertiser_id: Option<String>,

    /// Google Ads customer id, dashes allowed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_customer_id: Option<String>,
}

impl ConfigSection for AccountsConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Vec::new();
        if let Some(id) = &self.tiktok_advertiser_id {
            results.push(Validator::digits_only(id, "accounts.tiktok_advertiser_id"));
        }
        if let Some(id) = &self.google_customer_id {
            results.push(Validator::digits_only(
                &id.replace('-', ""),
                "accounts.google_customer_id",
            ));
        }
        Validator::collect_errors(results)
    }

    fn section_name(&self) -> &'static str {
        "accounts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_valid() {
        assert!(AccountsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_dashed_customer_id_is_valid() {
        let config = AccountsConfig {
            google_customer_id: Some("123-456-7890".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_numeric_ids_rejected() {
        let config = AccountsConfig {
            tiktok_advertiser_id: Some("adv-7001".into()),
            google_customer_id: Some("customers/1".into()),
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }
}
