//! TikTok Marketing API adapter
//!
//! TikTok answers most errors with HTTP 200 and a non-zero `code` in the
//! response envelope, so every response is unwrapped before use.

use crate::adapter::{configured, response_str, send_call, translate_http, PlatformAdapter};
use crate::transport::{PlatformCall, PlatformFailure, PlatformTransport};
use adrelay_core::{
    ActionResult, AdResult, AdsetResult, Budget, BudgetPeriod, CampaignResult, DeliveryStatus,
    Operation, Parameters, Platform, RelayError, RelayResult, StatusResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const PLATFORM: Platform = Platform::TikTok;

const CODE_OK: i64 = 0;
const CODE_NO_PERMISSION: i64 = 40001;
const CODE_INVALID_PARAMS: i64 = 40002;
const CODE_RATE_LIMIT: i64 = 40100;
const CODE_TOKEN_INVALID: i64 = 40104;
const CODE_TOKEN_EXPIRED: i64 = 40105;
const CODE_INSUFFICIENT_BALANCE: i64 = 40700;
const CODE_CREATIVE_REJECTED: i64 = 40911;
const CODE_INTERNAL: i64 = 50000;

pub struct TikTokAdapter {
    transport: Arc<dyn PlatformTransport>,
    advertiser_id: Option<String>,
}

impl TikTokAdapter {
    pub fn new(transport: Arc<dyn PlatformTransport>) -> Self {
        Self {
            transport,
            advertiser_id: None,
        }
    }

    /// Advertiser used by calls that only carry an object id
    pub fn with_advertiser_id(mut self, advertiser_id: impl Into<String>) -> Self {
        self.advertiser_id = Some(advertiser_id.into());
        self
    }

    pub fn translate(operation: Operation, failure: PlatformFailure) -> RelayError {
        let message = failure.message.clone();
        match failure.code {
            Some(CODE_RATE_LIMIT) => RelayError::RateLimited {
                platform: PLATFORM,
                retry_after: failure.retry_after,
            },
            Some(CODE_TOKEN_EXPIRED) => RelayError::TokenExpired { platform: PLATFORM },
            Some(CODE_TOKEN_INVALID) => RelayError::TokenInvalid {
                platform: PLATFORM,
                message,
            },
            Some(CODE_NO_PERMISSION) => RelayError::PermissionDenied {
                platform: PLATFORM,
                message,
            },
            Some(CODE_INVALID_PARAMS) => RelayError::InvalidRequest {
                operation: operation.as_str().to_string(),
                reason: message,
            },
            Some(CODE_INSUFFICIENT_BALANCE) => RelayError::InsufficientBudget {
                platform: PLATFORM,
                message,
            },
            Some(CODE_CREATIVE_REJECTED) => RelayError::CreativeRejected {
                platform: PLATFORM,
                reason: message,
            },
            Some(code) if code >= CODE_INTERNAL => RelayError::PlatformService {
                platform: PLATFORM,
                status: failure.status,
                message,
            },
            _ => translate_http(PLATFORM, operation, failure),
        }
    }

    /// Sends a call and returns the envelope's `data`
    async fn call(&self, operation: Operation, call: PlatformCall) -> RelayResult<Value> {
        let mut response =
            send_call(self.transport.as_ref(), operation, call, Self::translate).await?;

        let code = response["code"].as_i64().unwrap_or(CODE_OK);
        if code != CODE_OK {
            let message = response["message"]
                .as_str()
                .unwrap_or("unknown TikTok error")
                .to_string();
            return Err(Self::translate(
                operation,
                PlatformFailure::http(200, message).with_code(code),
            ));
        }
        Ok(response["data"].take())
    }

    fn advertiser(&self) -> RelayResult<&str> {
        configured(&self.advertiser_id, "TikTok advertiser_id")
    }

    async fn set_adgroup_status(
        &self,
        operation: Operation,
        adgroup_id: &str,
        status: &str,
    ) -> RelayResult<ActionResult> {
        let body = json!({
            "advertiser_id": self.advertiser()?,
            "adgroup_ids": [adgroup_id],
            "operation_status": status,
        });
        self.call(operation, PlatformCall::post(PLATFORM, "adgroup/status/update/", body))
            .await?;
        Ok(ActionResult::succeeded(PLATFORM, adgroup_id, operation.as_str()))
    }
}

fn budget_mode(budget: &Budget) -> &'static str {
    match budget.period {
        BudgetPeriod::Daily => "BUDGET_MODE_DAY",
        BudgetPeriod::Lifetime => "BUDGET_MODE_TOTAL",
    }
}

fn requested_status(params: &Parameters) -> (String, DeliveryStatus) {
    let raw = params
        .optional_str("status")
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_else(|| "DISABLE".to_string());
    let status = DeliveryStatus::from_platform(PLATFORM, &raw);
    (raw, status)
}

#[async_trait]
impl PlatformAdapter for TikTokAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn create_campaign(&self, params: &Parameters) -> RelayResult<CampaignResult> {
        let op = Operation::CreateCampaign;
        let advertiser_id = params.require_str(op.as_str(), "ad_account_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let (raw_status, status) = requested_status(params);

        let mut body = json!({
            "advertiser_id": advertiser_id,
            "campaign_name": name,
            "objective_type": params
                .optional_str("objective")
                .unwrap_or_else(|| "TRAFFIC".to_string()),
            "operation_status": raw_status,
            "budget_mode": "BUDGET_MODE_INFINITE",
        });
        if params.contains("daily_budget") || params.contains("lifetime_budget") {
            let budget = Budget::from_parameters(op.as_str(), params)?;
            body["budget_mode"] = json!(budget_mode(&budget));
            body["budget"] = json!(budget.amount);
        }

        let data = self
            .call(op, PlatformCall::post(PLATFORM, "campaign/create/", body))
            .await?;

        Ok(CampaignResult {
            platform: PLATFORM,
            campaign_id: response_str(PLATFORM, &data, "/campaign_id")?,
            name,
            status,
        })
    }

    async fn create_adset(&self, params: &Parameters) -> RelayResult<AdsetResult> {
        let op = Operation::CreateAdset;
        let advertiser_id = params.require_str(op.as_str(), "ad_account_id")?;
        let campaign_id = params.require_str(op.as_str(), "campaign_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let budget = Budget::from_parameters(op.as_str(), params)?;
        let (raw_status, status) = requested_status(params);

        let body = json!({
            "advertiser_id": advertiser_id,
            "campaign_id": campaign_id,
            "adgroup_name": name,
            "placement_type": "PLACEMENT_TYPE_AUTOMATIC",
            "location_ids": params.string_list("location_ids"),
            "budget_mode": budget_mode(&budget),
            "budget": budget.amount,
            "billing_event": params
                .optional_str("billing_event")
                .unwrap_or_else(|| "CPC".to_string()),
            "operation_status": raw_status,
        });
        let data = self
            .call(op, PlatformCall::post(PLATFORM, "adgroup/create/", body))
            .await?;

        Ok(AdsetResult {
            platform: PLATFORM,
            adset_id: response_str(PLATFORM, &data, "/adgroup_id")?,
            campaign_id,
            name,
            budget: Some(budget),
            status,
        })
    }

    async fn create_ad(&self, params: &Parameters) -> RelayResult<AdResult> {
        let op = Operation::CreateAd;
        let advertiser_id = params.require_str(op.as_str(), "ad_account_id")?;
        let adgroup_id = params.require_str(op.as_str(), "adset_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let ad_text = params.require_str(op.as_str(), "ad_text")?;
        let (_, status) = requested_status(params);

        let mut creative = json!({
            "ad_name": name,
            "ad_text": ad_text,
            "ad_format": "SINGLE_VIDEO",
        });
        for key in ["video_id", "identity_id", "call_to_action", "landing_page_url"] {
            if let Some(value) = params.optional_str(key) {
                creative[key] = json!(value);
            }
        }
        let body = json!({
            "advertiser_id": advertiser_id,
            "adgroup_id": adgroup_id,
            "creatives": [creative],
        });
        let data = self
            .call(op, PlatformCall::post(PLATFORM, "ad/create/", body))
            .await?;

        Ok(AdResult {
            platform: PLATFORM,
            ad_id: response_str(PLATFORM, &data, "/ad_ids/0")?,
            adset_id: adgroup_id,
            name,
            status,
        })
    }

    async fn update_budget(&self, adset_id: &str, budget: Budget) -> RelayResult<ActionResult> {
        let op = Operation::UpdateBudget;
        let body = json!({
            "advertiser_id": self.advertiser()?,
            "adgroup_id": adset_id,
            "budget_mode": budget_mode(&budget),
            "budget": budget.amount,
        });
        self.call(op, PlatformCall::post(PLATFORM, "adgroup/update/", body))
            .await?;
        Ok(ActionResult::succeeded(PLATFORM, adset_id, op.as_str()))
    }

    async fn pause_adset(&self, adset_id: &str) -> RelayResult<ActionResult> {
        self.set_adgroup_status(Operation::PauseAdset, adset_id, "DISABLE")
            .await
    }

    async fn resume_adset(&self, adset_id: &str) -> RelayResult<ActionResult> {
        self.set_adgroup_status(Operation::ResumeAdset, adset_id, "ENABLE")
            .await
    }

    async fn get_campaign_status(&self, campaign_id: &str) -> RelayResult<StatusResult> {
        let op = Operation::GetStatus;
        let filtering = json!({ "campaign_ids": [campaign_id] }).to_string();
        let call = PlatformCall::get(PLATFORM, "campaign/get/")
            .with_query("advertiser_id", self.advertiser()?)
            .with_query("filtering", filtering);
        let data = self.call(op, call).await?;

        let campaign = data
            .pointer("/list/0")
            .ok_or_else(|| RelayError::InvalidRequest {
                operation: op.as_str().to_string(),
                reason: format!("campaign '{}' not found", campaign_id),
            })?;
        let platform_status = response_str(PLATFORM, campaign, "/secondary_status")
            .or_else(|_| response_str(PLATFORM, campaign, "/operation_status"))?;

        Ok(StatusResult {
            platform: PLATFORM,
            campaign_id: campaign_id.to_string(),
            status: DeliveryStatus::from_platform(PLATFORM, &platform_status),
            platform_status,
            name: campaign["campaign_name"].as_str().map(str::to_string),
        })
    }

    async fn delete_campaign(&self, campaign_id: &str) -> RelayResult<ActionResult> {
        let op = Operation::DeleteCampaign;
        let body = json!({
            "advertiser_id": self.advertiser()?,
            "campaign_ids": [campaign_id],
            "operation_status": "DELETE",
        });
        self.call(op, PlatformCall::post(PLATFORM, "campaign/status/update/", body))
            .await?;
        Ok(ActionResult::succeeded(PLATFORM, campaign_id, op.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SandboxTransport;
    use serde_json::json;

    /// Transport answering every call with one fixed envelope
    struct Envelope(Value);

    #[async_trait]
    impl PlatformTransport for Envelope {
        async fn send(&self, _call: PlatformCall) -> Result<Value, PlatformFailure> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_create_adset_uses_major_units() {
        let sandbox = Arc::new(SandboxTransport::new());
        let tiktok = TikTokAdapter::new(sandbox.clone());
        let params = Parameters::new()
            .with("ad_account_id", "7001")
            .with("campaign_id", "1700000000000000001")
            .with("name", "Gen Z")
            .with("lifetime_budget", 500);

        let adset = tiktok.create_adset(&params).await.unwrap();
        assert_eq!(adset.budget, Some(Budget::lifetime(500.0)));
        assert_eq!(adset.status, DeliveryStatus::Paused);

        let sent = sandbox.sent();
        assert_eq!(sent[0].path, "adgroup/create/");
        assert_eq!(sent[0].body["budget_mode"], "BUDGET_MODE_TOTAL");
        assert_eq!(sent[0].body["budget"], 500.0);
    }

    #[tokio::test]
    async fn test_id_only_calls_need_advertiser() {
        let sandbox = Arc::new(SandboxTransport::new());
        let tiktok = TikTokAdapter::new(sandbox.clone());

        let err = tiktok.pause_adset("123").await.unwrap_err();
        assert!(matches!(err, RelayError::MissingDependency(_)));
        assert_eq!(sandbox.calls(), 0);

        let tiktok = TikTokAdapter::new(sandbox.clone()).with_advertiser_id("7001");
        let result = tiktok.pause_adset("123").await.unwrap();
        assert!(result.success);
        assert_eq!(sandbox.sent()[0].body["operation_status"], "DISABLE");
    }

    #[tokio::test]
    async fn test_status_lookup() {
        let tiktok =
            TikTokAdapter::new(Arc::new(SandboxTransport::new())).with_advertiser_id("7001");
        let status = tiktok.get_campaign_status("1700000000000000042").await.unwrap();
        assert_eq!(status.campaign_id, "1700000000000000042");
        assert_eq!(status.status, DeliveryStatus::Active);
    }

    #[tokio::test]
    async fn test_envelope_errors_are_translated() {
        let throttled = Envelope(json!({
            "code": 40100,
            "message": "Too many requests",
            "data": {},
        }));
        let tiktok = TikTokAdapter::new(Arc::new(throttled)).with_advertiser_id("7001");
        assert!(matches!(
            tiktok.resume_adset("1").await.unwrap_err(),
            RelayError::RateLimited { .. }
        ));

        let expired = Envelope(json!({
            "code": 40105,
            "message": "Access token expired",
            "data": {},
        }));
        let tiktok = TikTokAdapter::new(Arc::new(expired)).with_advertiser_id("7001");
        assert!(matches!(
            tiktok.delete_campaign("1").await.unwrap_err(),
            RelayError::TokenExpired { .. }
        ));
    }

    #[test]
    fn test_code_table() {
        let op = Operation::CreateAd;
        let translate =
            |code| TikTokAdapter::translate(op, PlatformFailure::http(200, "x").with_code(code));
        assert!(matches!(translate(40104), RelayError::TokenInvalid { .. }));
        assert!(matches!(translate(40001), RelayError::PermissionDenied { .. }));
        assert!(matches!(translate(40002), RelayError::InvalidRequest { .. }));
        assert!(matches!(translate(40700), RelayError::InsufficientBudget { .. }));
        assert!(matches!(translate(40911), RelayError::CreativeRejected { .. }));
        assert!(matches!(translate(51004), RelayError::PlatformService { .. }));
    }
}
