//! The contract every platform implements, plus shared helpers

use crate::transport::{PlatformCall, PlatformFailure, PlatformTransport};
use adrelay_core::{
    ActionResult, AdResult, AdsetResult, Budget, CampaignResult, Operation, Parameters, Platform,
    RelayError, RelayResult, StatusResult,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// One advertising platform behind the uniform operation set
///
/// Every method checks its required parameters before anything is sent, so
/// a malformed request costs no transport call.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn create_campaign(&self, params: &Parameters) -> RelayResult<CampaignResult>;

    async fn create_adset(&self, params: &Parameters) -> RelayResult<AdsetResult>;

    async fn create_ad(&self, params: &Parameters) -> RelayResult<AdResult>;

    async fn update_budget(&self, adset_id: &str, budget: Budget) -> RelayResult<ActionResult>;

    async fn pause_adset(&self, adset_id: &str) -> RelayResult<ActionResult>;

    async fn resume_adset(&self, adset_id: &str) -> RelayResult<ActionResult>;

    async fn get_campaign_status(&self, campaign_id: &str) -> RelayResult<StatusResult>;

    async fn delete_campaign(&self, campaign_id: &str) -> RelayResult<ActionResult>;

    /// Runs a logical operation, pulling ids and budgets out of `params`
    async fn perform(&self, operation: Operation, params: &Parameters) -> RelayResult<Value> {
        let op = operation.as_str();
        match operation {
            Operation::CreateCampaign => to_value(self.create_campaign(params).await?),
            Operation::CreateAdset => to_value(self.create_adset(params).await?),
            Operation::CreateAd => to_value(self.create_ad(params).await?),
            Operation::UpdateBudget => {
                let adset_id = params.require_str(op, "adset_id")?;
                let budget = Budget::from_parameters(op, params)?;
                to_value(self.update_budget(&adset_id, budget).await?)
            }
            Operation::PauseAdset => {
                let adset_id = params.require_str(op, "adset_id")?;
                to_value(self.pause_adset(&adset_id).await?)
            }
            Operation::ResumeAdset => {
                let adset_id = params.require_str(op, "adset_id")?;
                to_value(self.resume_adset(&adset_id).await?)
            }
            Operation::GetStatus => {
                let campaign_id = params.require_str(op, "campaign_id")?;
                to_value(self.get_campaign_status(&campaign_id).await?)
            }
            Operation::DeleteCampaign => {
                let campaign_id = params.require_str(op, "campaign_id")?;
                to_value(self.delete_campaign(&campaign_id).await?)
            }
        }
    }
}

fn to_value<T: Serialize>(result: T) -> RelayResult<Value> {
    Ok(serde_json::to_value(result)?)
}

/// Sends a call and turns any failure into a [`RelayError`] with `translate`
pub(crate) async fn send_call<F>(
    transport: &dyn PlatformTransport,
    operation: Operation,
    call: PlatformCall,
    translate: F,
) -> RelayResult<Value>
where
    F: FnOnce(Operation, PlatformFailure) -> RelayError,
{
    log::debug!("{} for {}", call, operation);
    transport.send(call).await.map_err(|failure| {
        log::debug!("{} failed: {:?}", operation, failure);
        translate(operation, failure)
    })
}

/// Translation shared by all platforms, keyed on the HTTP status
pub fn translate_http(
    platform: Platform,
    operation: Operation,
    failure: PlatformFailure,
) -> RelayError {
    if let Some(after) = failure.timed_out_after {
        return RelayError::PlatformTimeout { platform, after };
    }

    let message = failure.message;
    match failure.status {
        None => RelayError::PlatformService {
            platform,
            status: None,
            message,
        },
        Some(401) if message.to_ascii_lowercase().contains("expired") => {
            RelayError::TokenExpired { platform }
        }
        Some(401) => RelayError::TokenInvalid { platform, message },
        Some(403) => RelayError::PermissionDenied { platform, message },
        Some(429) => RelayError::RateLimited {
            platform,
            retry_after: failure.retry_after,
        },
        Some(status) if status >= 500 || status == 408 => RelayError::PlatformService {
            platform,
            status: Some(status),
            message,
        },
        Some(400) | Some(404) | Some(422) => RelayError::InvalidRequest {
            operation: operation.as_str().to_string(),
            reason: message,
        },
        Some(status) => RelayError::Unexpected {
            message: format!(
                "{} answered {} with status {}: {}",
                platform, operation, status, message
            ),
            source: None,
        },
    }
}

/// Reads a string (or number) at a JSON pointer of a platform response
pub(crate) fn response_str(
    platform: Platform,
    response: &Value,
    pointer: &str,
) -> RelayResult<String> {
    match response.pointer(pointer) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(RelayError::Unexpected {
            message: format!("{} response has no '{}'", platform, pointer),
            source: None,
        }),
    }
}

/// Fails with a missing-dependency error when an account id is not configured
pub(crate) fn configured<'a>(value: &'a Option<String>, what: &str) -> RelayResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| RelayError::MissingDependency(what.to_string()))
}
