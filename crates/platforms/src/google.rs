//! Google Ads API adapter
//!
//! Ad sets map onto ad groups. Budgets live on campaign budget resources, so
//! `update_budget` addresses a campaign budget id.

use crate::adapter::{configured, response_str, send_call, translate_http, PlatformAdapter};
use crate::transport::{PlatformCall, PlatformFailure, PlatformTransport};
use adrelay_core::{
    ActionResult, AdResult, AdsetResult, Budget, CampaignResult, DeliveryStatus, Operation,
    Parameters, Platform, RelayError, RelayResult, StatusResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const PLATFORM: Platform = Platform::Google;

pub struct GoogleAdapter {
    transport: Arc<dyn PlatformTransport>,
    customer_id: Option<String>,
}

impl GoogleAdapter {
    pub fn new(transport: Arc<dyn PlatformTransport>) -> Self {
        Self {
            transport,
            customer_id: None,
        }
    }

    /// Customer account used by calls that only carry an object id
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(normalize_customer(&customer_id.into()));
        self
    }

    /// Maps Google Ads error reasons, falling back to the HTTP status
    pub fn translate(operation: Operation, failure: PlatformFailure) -> RelayError {
        let message = failure.message.clone();
        let reason = failure.reason.clone().unwrap_or_default();
        match reason.as_str() {
            "RESOURCE_EXHAUSTED" | "QUOTA_ERROR" | "RESOURCE_TEMPORARILY_EXHAUSTED" => {
                RelayError::RateLimited {
                    platform: PLATFORM,
                    retry_after: failure.retry_after,
                }
            }
            "AUTHENTICATION_ERROR" | "UNAUTHENTICATED"
                if message.to_ascii_lowercase().contains("expired") =>
            {
                RelayError::TokenExpired { platform: PLATFORM }
            }
            "AUTHENTICATION_ERROR" | "UNAUTHENTICATED" => RelayError::TokenInvalid {
                platform: PLATFORM,
                message,
            },
            "AUTHORIZATION_ERROR" | "PERMISSION_DENIED" => RelayError::PermissionDenied {
                platform: PLATFORM,
                message,
            },
            "INTERNAL_ERROR" | "UNAVAILABLE" | "TRANSIENT_ERROR" => RelayError::PlatformService {
                platform: PLATFORM,
                status: failure.status,
                message,
            },
            "BUDGET_ERROR" | "BILLING_SETUP_ERROR" => RelayError::InsufficientBudget {
                platform: PLATFORM,
                message,
            },
            "POLICY_FINDING_ERROR" | "POLICY_VIOLATION_ERROR" => RelayError::CreativeRejected {
                platform: PLATFORM,
                reason: message,
            },
            "REQUEST_ERROR" | "FIELD_ERROR" | "MUTATE_ERROR" | "INVALID_ARGUMENT" => {
                RelayError::InvalidRequest {
                    operation: operation.as_str().to_string(),
                    reason: message,
                }
            }
            _ => translate_http(PLATFORM, operation, failure),
        }
    }

    async fn call(&self, operation: Operation, call: PlatformCall) -> RelayResult<Value> {
        send_call(self.transport.as_ref(), operation, call, Self::translate).await
    }

    fn customer(&self) -> RelayResult<&str> {
        configured(&self.customer_id, "Google Ads customer_id")
    }

    /// Runs one mutate operation and returns the resulting resource id
    async fn mutate(
        &self,
        operation: Operation,
        customer: &str,
        collection: &str,
        op: Value,
    ) -> RelayResult<String> {
        let path = format!("customers/{}/{}:mutate", customer, collection);
        let response = self
            .call(operation, PlatformCall::post(PLATFORM, path, json!({ "operations": [op] })))
            .await?;
        let resource = response_str(PLATFORM, &response, "/results/0/resourceName")?;
        Ok(resource_id(&resource).to_string())
    }

    async fn set_ad_group_status(
        &self,
        operation: Operation,
        ad_group_id: &str,
        status: &str,
    ) -> RelayResult<ActionResult> {
        let customer = self.customer()?;
        let op = json!({
            "update": {
                "resourceName": format!("customers/{}/adGroups/{}", customer, ad_group_id),
                "status": status,
            },
            "updateMask": "status",
        });
        self.mutate(operation, customer, "adGroups", op).await?;
        Ok(ActionResult::succeeded(PLATFORM, ad_group_id, operation.as_str()))
    }
}

/// Customer ids are often written `123-456-7890`
fn normalize_customer(id: &str) -> String {
    id.chars().filter(|c| *c != '-').collect()
}

/// Last path segment of a resource name
fn resource_id(resource: &str) -> &str {
    resource.rsplit('/').next().unwrap_or(resource)
}

/// GAQL is built by string, so ids must be plain digits
fn numeric_id(operation: Operation, field: &str, id: &str) -> RelayResult<()> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(RelayError::InvalidRequest {
            operation: operation.as_str().to_string(),
            reason: format!("{} must be numeric", field),
        })
    }
}

fn requested_status(params: &Parameters) -> (String, DeliveryStatus) {
    let raw = params
        .optional_str("status")
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_else(|| "PAUSED".to_string());
    let status = DeliveryStatus::from_platform(PLATFORM, &raw);
    (raw, status)
}

#[async_trait]
impl PlatformAdapter for GoogleAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn create_campaign(&self, params: &Parameters) -> RelayResult<CampaignResult> {
        let op = Operation::CreateCampaign;
        let customer = normalize_customer(&params.require_str(op.as_str(), "ad_account_id")?);
        let name = params.require_str(op.as_str(), "name")?;
        let budget = Budget::from_parameters(op.as_str(), params)?;
        let (raw_status, status) = requested_status(params);

        // Both resources go in one atomic batch so a retried attempt can
        // never leave an orphaned budget behind.
        let budget_resource = format!("customers/{}/campaignBudgets/-1", customer);
        let body = json!({ "mutateOperations": [
            { "campaignBudgetOperation": { "create": {
                "resourceName": budget_resource,
                "name": format!("{} budget", name),
                "amountMicros": budget.micros().to_string(),
                "deliveryMethod": "STANDARD",
            }}},
            { "campaignOperation": { "create": {
                "name": name,
                "status": raw_status,
                "advertisingChannelType": params
                    .optional_str("channel_type")
                    .unwrap_or_else(|| "SEARCH".to_string()),
                "campaignBudget": budget_resource,
                "manualCpc": {},
            }}},
        ]});
        let path = format!("customers/{}/googleAds:mutate", customer);
        let response = self.call(op, PlatformCall::post(PLATFORM, path, body)).await?;
        let resource = response_str(
            PLATFORM,
            &response,
            "/mutateOperationResponses/1/campaignResult/resourceName",
        )?;
        let campaign_id = resource_id(&resource).to_string();

        Ok(CampaignResult {
            platform: PLATFORM,
            campaign_id,
            name,
            status,
        })
    }

    async fn create_adset(&self, params: &Parameters) -> RelayResult<AdsetResult> {
        let op = Operation::CreateAdset;
        let customer = normalize_customer(&params.require_str(op.as_str(), "ad_account_id")?);
        let campaign_id = params.require_str(op.as_str(), "campaign_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let (raw_status, status) = requested_status(params);

        let mut create = json!({
            "name": name,
            "campaign": format!("customers/{}/campaigns/{}", customer, campaign_id),
            "status": raw_status,
            "type": "SEARCH_STANDARD",
        });
        if let Some(bid) = params.optional_amount(op.as_str(), "cpc_bid")? {
            create["cpcBidMicros"] = json!(((bid * 1_000_000.0).round() as i64).to_string());
        }
        let adset_id = self
            .mutate(op, &customer, "adGroups", json!({ "create": create }))
            .await?;

        Ok(AdsetResult {
            platform: PLATFORM,
            adset_id,
            campaign_id,
            name,
            budget: None,
            status,
        })
    }

    async fn create_ad(&self, params: &Parameters) -> RelayResult<AdResult> {
        let op = Operation::CreateAd;
        let customer = normalize_customer(&params.require_str(op.as_str(), "ad_account_id")?);
        let ad_group_id = params.require_str(op.as_str(), "adset_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let final_url = params.require_str(op.as_str(), "final_url")?;
        let (raw_status, status) = requested_status(params);

        let text_assets = |key: &str| -> Vec<Value> {
            params
                .string_list(key)
                .into_iter()
                .map(|text| json!({ "text": text }))
                .collect()
        };
        let op_body = json!({ "create": {
            "adGroup": format!("customers/{}/adGroups/{}", customer, ad_group_id),
            "status": raw_status,
            "ad": {
                "name": name,
                "finalUrls": [final_url],
                "responsiveSearchAd": {
                    "headlines": text_assets("headlines"),
                    "descriptions": text_assets("descriptions"),
                },
            },
        }});
        let ad_id = self.mutate(op, &customer, "adGroupAds", op_body).await?;

        Ok(AdResult {
            platform: PLATFORM,
            // adGroupAds resource names end in `{ad_group_id}~{ad_id}`
            ad_id: ad_id.rsplit('~').next().unwrap_or(&ad_id).to_string(),
            adset_id: ad_group_id,
            name,
            status,
        })
    }

    async fn update_budget(&self, adset_id: &str, budget: Budget) -> RelayResult<ActionResult> {
        let op = Operation::UpdateBudget;
        let customer = self.customer()?;
        let update = json!({
            "update": {
                "resourceName": format!("customers/{}/campaignBudgets/{}", customer, adset_id),
                "amountMicros": budget.micros().to_string(),
            },
            "updateMask": "amount_micros",
        });
        self.mutate(op, customer, "campaignBudgets", update).await?;
        Ok(ActionResult::succeeded(PLATFORM, adset_id, op.as_str()))
    }

    async fn pause_adset(&self, adset_id: &str) -> RelayResult<ActionResult> {
        self.set_ad_group_status(Operation::PauseAdset, adset_id, "PAUSED")
            .await
    }

    async fn resume_adset(&self, adset_id: &str) -> RelayResult<ActionResult> {
        self.set_ad_group_status(Operation::ResumeAdset, adset_id, "ENABLED")
            .await
    }

    async fn get_campaign_status(&self, campaign_id: &str) -> RelayResult<StatusResult> {
        let op = Operation::GetStatus;
        let customer = self.customer()?;
        numeric_id(op, "campaign_id", campaign_id)?;

        let query = format!(
            "SELECT campaign.id, campaign.name, campaign.status FROM campaign WHERE campaign.id = {}",
            campaign_id
        );
        let path = format!("customers/{}/googleAds:search", customer);
        let response = self
            .call(op, PlatformCall::post(PLATFORM, path, json!({ "query": query })))
            .await?;

        let campaign = response
            .pointer("/results/0/campaign")
            .ok_or_else(|| RelayError::InvalidRequest {
                operation: op.as_str().to_string(),
                reason: format!("campaign '{}' not found", campaign_id),
            })?;
        let platform_status = response_str(PLATFORM, campaign, "/status")?;

        Ok(StatusResult {
            platform: PLATFORM,
            campaign_id: campaign_id.to_string(),
            status: DeliveryStatus::from_platform(PLATFORM, &platform_status),
            platform_status,
            name: campaign["name"].as_str().map(str::to_string),
        })
    }

    async fn delete_campaign(&self, campaign_id: &str) -> RelayResult<ActionResult> {
        let op = Operation::DeleteCampaign;
        let customer = self.customer()?;
        let remove = json!({
            "remove": format!("customers/{}/campaigns/{}", customer, campaign_id),
        });
        self.mutate(op, customer, "campaigns", remove).await?;
        Ok(ActionResult::succeeded(PLATFORM, campaign_id, op.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SandboxTransport;

    #[tokio::test]
    async fn test_create_campaign_sends_budget_and_campaign_together() {
        let sandbox = Arc::new(SandboxTransport::new());
        let google = GoogleAdapter::new(sandbox.clone());
        let params = Parameters::new()
            .with("ad_account_id", "123-456-7890")
            .with("name", "Brand search")
            .with("daily_budget", 20);

        let campaign = google.create_campaign(&params).await.unwrap();
        assert_eq!(campaign.status, DeliveryStatus::Paused);

        let sent = sandbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, "customers/1234567890/googleAds:mutate");
        let ops = &sent[0].body["mutateOperations"];
        assert_eq!(
            ops[0]["campaignBudgetOperation"]["create"]["amountMicros"],
            "20000000"
        );
        assert_eq!(
            ops[1]["campaignOperation"]["create"]["campaignBudget"],
            ops[0]["campaignBudgetOperation"]["create"]["resourceName"]
        );
        assert_eq!(campaign.campaign_id, "20000002");
    }

    #[tokio::test]
    async fn test_status_rejects_non_numeric_ids() {
        let sandbox = Arc::new(SandboxTransport::new());
        let google = GoogleAdapter::new(sandbox.clone()).with_customer_id("1234567890");

        let err = google
            .get_campaign_status("1 OR 1=1")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest { .. }));
        assert_eq!(sandbox.calls(), 0);

        let status = google.get_campaign_status("20000042").await.unwrap();
        assert_eq!(status.status, DeliveryStatus::Active);
        assert_eq!(status.platform_status, "ENABLED");
    }

    #[tokio::test]
    async fn test_pause_updates_ad_group_status() {
        let sandbox = Arc::new(SandboxTransport::new());
        let google = GoogleAdapter::new(sandbox.clone()).with_customer_id("123-456-7890");

        let result = google.pause_adset("555").await.unwrap();
        assert_eq!(result.object_id, "555");
        let sent = sandbox.sent();
        assert_eq!(sent[0].body["operations"][0]["update"]["status"], "PAUSED");
        assert_eq!(
            sent[0].body["operations"][0]["update"]["resourceName"],
            "customers/1234567890/adGroups/555"
        );
    }

    #[tokio::test]
    async fn test_missing_customer_is_dependency_error() {
        let google = GoogleAdapter::new(Arc::new(SandboxTransport::new()));
        assert!(matches!(
            google.delete_campaign("1").await.unwrap_err(),
            RelayError::MissingDependency(_)
        ));
    }

    #[test]
    fn test_reason_table() {
        let op = Operation::UpdateBudget;
        let translate = |reason: &str, message: &str| {
            GoogleAdapter::translate(op, PlatformFailure::http(400, message).with_reason(reason))
        };
        assert!(matches!(translate("QUOTA_ERROR", "quota"), RelayError::RateLimited { .. }));
        assert!(matches!(
            translate("AUTHENTICATION_ERROR", "OAuth token expired"),
            RelayError::TokenExpired { .. }
        ));
        assert!(matches!(
            translate("AUTHORIZATION_ERROR", "no access"),
            RelayError::PermissionDenied { .. }
        ));
        assert!(matches!(
            translate("POLICY_FINDING_ERROR", "trademark"),
            RelayError::CreativeRejected { .. }
        ));
        assert!(matches!(
            translate("FIELD_ERROR", "required"),
            RelayError::InvalidRequest { .. }
        ));
        assert!(matches!(
            translate("", "internal"),
            RelayError::InvalidRequest { .. }
        ));
    }
}
