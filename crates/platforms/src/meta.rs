//! Meta (Graph API) adapter

use crate::adapter::{response_str, send_call, translate_http, PlatformAdapter};
use crate::transport::{PlatformCall, PlatformFailure, PlatformTransport};
use adrelay_core::{
    ActionResult, AdResult, AdsetResult, Budget, BudgetPeriod, CampaignResult, DeliveryStatus,
    Operation, Parameters, Platform, RelayError, RelayResult, StatusResult,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const PLATFORM: Platform = Platform::Meta;

// Graph API error codes
const CODE_API_UNKNOWN: i64 = 1;
const CODE_API_SERVICE: i64 = 2;
const CODE_TOO_MANY_CALLS: i64 = 4;
const CODE_PERMISSION: i64 = 10;
const CODE_USER_TOO_MANY_CALLS: i64 = 17;
const CODE_PAGE_TOO_MANY_CALLS: i64 = 32;
const CODE_INVALID_PARAMETER: i64 = 100;
const CODE_ACCESS_TOKEN: i64 = 190;
const CODE_POLICY: i64 = 368;
const CODE_RATE_LIMIT: i64 = 613;
const CODE_AD_ACCOUNT_RATE: i64 = 80004;
const SUBCODE_TOKEN_EXPIRED: i64 = 463;
const SUBCODE_ACCOUNT_FUNDING: i64 = 1487533;
const SUBCODE_BUDGET_TOO_LOW: i64 = 1885272;
const SUBCODE_CREATIVE_REJECTED: i64 = 1487390;

pub struct MetaAdapter {
    transport: Arc<dyn PlatformTransport>,
}

impl MetaAdapter {
    pub fn new(transport: Arc<dyn PlatformTransport>) -> Self {
        Self { transport }
    }

    /// Maps Graph API error codes, falling back to the HTTP status
    pub fn translate(operation: Operation, failure: PlatformFailure) -> RelayError {
        let message = failure.message.clone();
        match (failure.code, failure.subcode) {
            (Some(CODE_ACCESS_TOKEN), Some(SUBCODE_TOKEN_EXPIRED)) => {
                RelayError::TokenExpired { platform: PLATFORM }
            }
            (Some(CODE_ACCESS_TOKEN), _) => RelayError::TokenInvalid {
                platform: PLATFORM,
                message,
            },
            (
                Some(
                    CODE_TOO_MANY_CALLS
                    | CODE_USER_TOO_MANY_CALLS
                    | CODE_PAGE_TOO_MANY_CALLS
                    | CODE_RATE_LIMIT
                    | CODE_AD_ACCOUNT_RATE,
                ),
                _,
            ) => RelayError::RateLimited {
                platform: PLATFORM,
                retry_after: failure.retry_after,
            },
            (Some(CODE_PERMISSION), _) | (Some(200..=299), _) => RelayError::PermissionDenied {
                platform: PLATFORM,
                message,
            },
            (Some(CODE_API_UNKNOWN | CODE_API_SERVICE), _) => RelayError::PlatformService {
                platform: PLATFORM,
                status: failure.status,
                message,
            },
            (_, Some(SUBCODE_ACCOUNT_FUNDING | SUBCODE_BUDGET_TOO_LOW)) => {
                RelayError::InsufficientBudget {
                    platform: PLATFORM,
                    message,
                }
            }
            (Some(CODE_POLICY), _) | (_, Some(SUBCODE_CREATIVE_REJECTED)) => {
                RelayError::CreativeRejected {
                    platform: PLATFORM,
                    reason: message,
                }
            }
            (Some(CODE_INVALID_PARAMETER), _) => RelayError::InvalidRequest {
                operation: operation.as_str().to_string(),
                reason: message,
            },
            _ => translate_http(PLATFORM, operation, failure),
        }
    }

    async fn call(&self, operation: Operation, call: PlatformCall) -> RelayResult<Value> {
        send_call(self.transport.as_ref(), operation, call, Self::translate).await
    }

    async fn set_status(
        &self,
        operation: Operation,
        id: &str,
        status: &str,
    ) -> RelayResult<ActionResult> {
        self.call(
            operation,
            PlatformCall::post(PLATFORM, id, json!({ "status": status })),
        )
        .await?;
        Ok(ActionResult::succeeded(PLATFORM, id, operation.as_str()))
    }
}

/// Graph account path; accepts ids with or without the `act_` prefix
fn account_path(ad_account_id: &str, edge: &str) -> String {
    let id = ad_account_id.strip_prefix("act_").unwrap_or(ad_account_id);
    format!("act_{}/{}", id, edge)
}

/// Graph budgets are integers in the account currency's minor unit
fn budget_field(budget: &Budget, body: &mut Map<String, Value>) {
    let field = match budget.period {
        BudgetPeriod::Daily => "daily_budget",
        BudgetPeriod::Lifetime => "lifetime_budget",
    };
    body.insert(field.to_string(), json!(budget.minor_units()));
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
impl PlatformAdapter for MetaAdapter {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    async fn create_campaign(&self, params: &Parameters) -> RelayResult<CampaignResult> {
        let op = Operation::CreateCampaign;
        let account = params.require_str(op.as_str(), "ad_account_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let (raw_status, status) = requested_status(params);

        let mut body = Map::new();
        body.insert("name".into(), json!(name));
        body.insert(
            "objective".into(),
            json!(params
                .optional_str("objective")
                .unwrap_or_else(|| "OUTCOME_TRAFFIC".to_string())),
        );
        body.insert("status".into(), json!(raw_status));
        body.insert(
            "special_ad_categories".into(),
            json!(params.string_list("special_ad_categories")),
        );
        if params.contains("daily_budget") || params.contains("lifetime_budget") {
            budget_field(&Budget::from_parameters(op.as_str(), params)?, &mut body);
        }

        let response = self
            .call(
                op,
                PlatformCall::post(
                    PLATFORM,
                    account_path(&account, "campaigns"),
                    Value::Object(body),
                ),
            )
            .await?;

        Ok(CampaignResult {
            platform: PLATFORM,
            campaign_id: response_str(PLATFORM, &response, "/id")?,
            name,
            status,
        })
    }

    async fn create_adset(&self, params: &Parameters) -> RelayResult<AdsetResult> {
        let op = Operation::CreateAdset;
        let account = params.require_str(op.as_str(), "ad_account_id")?;
        let campaign_id = params.require_str(op.as_str(), "campaign_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let budget = Budget::from_parameters(op.as_str(), params)?;
        let (raw_status, status) = requested_status(params);

        let mut countries = params.string_list("countries");
        if countries.is_empty() {
            countries.push("US".to_string());
        }

        let mut body = Map::new();
        body.insert("name".into(), json!(name));
        body.insert("campaign_id".into(), json!(campaign_id));
        body.insert(
            "billing_event".into(),
            json!(params
                .optional_str("billing_event")
                .unwrap_or_else(|| "IMPRESSIONS".to_string())),
        );
        body.insert(
            "optimization_goal".into(),
            json!(params
                .optional_str("optimization_goal")
                .unwrap_or_else(|| "LINK_CLICKS".to_string())),
        );
        body.insert(
            "targeting".into(),
            json!({ "geo_locations": { "countries": countries } }),
        );
        body.insert("status".into(), json!(raw_status));
        budget_field(&budget, &mut body);

        let response = self
            .call(
                op,
                PlatformCall::post(PLATFORM, account_path(&account, "adsets"), Value::Object(body)),
            )
            .await?;

        Ok(AdsetResult {
            platform: PLATFORM,
            adset_id: response_str(PLATFORM, &response, "/id")?,
            campaign_id,
            name,
            budget: Some(budget),
            status,
        })
    }

    async fn create_ad(&self, params: &Parameters) -> RelayResult<AdResult> {
        let op = Operation::CreateAd;
        let account = params.require_str(op.as_str(), "ad_account_id")?;
        let adset_id = params.require_str(op.as_str(), "adset_id")?;
        let name = params.require_str(op.as_str(), "name")?;
        let creative_id = params.require_str(op.as_str(), "creative_id")?;
        let (raw_status, status) = requested_status(params);

        let body = json!({
            "name": name,
            "adset_id": adset_id,
            "creative": { "creative_id": creative_id },
            "status": raw_status,
        });
        let response = self
            .call(op, PlatformCall::post(PLATFORM, account_path(&account, "ads"), body))
            .await?;

        Ok(AdResult {
            platform: PLATFORM,
            ad_id: response_str(PLATFORM, &response, "/id")?,
            adset_id,
            name,
            status,
        })
    }

    async fn update_budget(&self, adset_id: &str, budget: Budget) -> RelayResult<ActionResult> {
        let op = Operation::UpdateBudget;
        let mut body = Map::new();
        budget_field(&budget, &mut body);
        self.call(op, PlatformCall::post(PLATFORM, adset_id, Value::Object(body)))
            .await?;
        Ok(ActionResult::succeeded(PLATFORM, adset_id, op.as_str()))
    }

    async fn pause_adset(&self, adset_id: &str) -> RelayResult<ActionResult> {
        self.set_status(Operation::PauseAdset, adset_id, "PAUSED").await
    }

    async fn resume_adset(&self, adset_id: &str) -> RelayResult<ActionResult> {
        self.set_status(Operation::ResumeAdset, adset_id, "ACTIVE").await
    }

    async fn get_campaign_status(&self, campaign_id: &str) -> RelayResult<StatusResult> {
        let call = PlatformCall::get(PLATFORM, campaign_id)
            .with_query("fields", "id,name,status,effective_status");
        let response = self.call(Operation::GetStatus, call).await?;

        let platform_status = response_str(PLATFORM, &response, "/effective_status")
            .or_else(|_| response_str(PLATFORM, &response, "/status"))?;
        Ok(StatusResult {
            platform: PLATFORM,
            campaign_id: campaign_id.to_string(),
            status: DeliveryStatus::from_platform(PLATFORM, &platform_status),
            platform_status,
            name: response["name"].as_str().map(str::to_string),
        })
    }

    async fn delete_campaign(&self, campaign_id: &str) -> RelayResult<ActionResult> {
        let op = Operation::DeleteCampaign;
        self.call(op, PlatformCall::delete(PLATFORM, campaign_id)).await?;
        Ok(ActionResult::succeeded(PLATFORM, campaign_id, op.as_str()))
    }
}
