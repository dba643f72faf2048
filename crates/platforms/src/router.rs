//! Dispatch of operation requests to platform adapters

use crate::adapter::PlatformAdapter;
use crate::google::GoogleAdapter;
use crate::meta::MetaAdapter;
use crate::tiktok::TikTokAdapter;
use crate::transport::PlatformTransport;
use adrelay_core::{
    ErrorHandler, ErrorResponse, Operation, OperationRequest, Parameters, Platform, RelayError,
    RelayResult,
};
use adrelay_resilience::{retry_with_backoff, RetryPolicy, TimeoutCategory, TimeoutConfig};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Successful result of a dispatched operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub platform: Platform,
    pub operation: Operation,
    /// Executions made, including the successful one
    pub attempts: u32,
    #[serde(skip)]
    pub elapsed: Duration,
    /// Answered from the cache without reaching the platform
    pub from_cache: bool,
    pub data: Value,
    /// Set when the platform change went through but could not be recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

/// Account ids used by adapters for calls that carry only an object id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformAccounts {
    pub tiktok_advertiser_id: Option<String>,
    pub google_customer_id: Option<String>,
}

/// Builder for [`PlatformRouter`]
pub struct PlatformRouterBuilder {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    retry: RetryPolicy,
    timeouts: TimeoutConfig,
}

impl PlatformRouterBuilder {
    /// Registers an adapter, replacing any earlier one for the same platform
    pub fn register(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    /// Registers the Meta, TikTok and Google adapters over one transport
    pub fn with_standard_adapters(
        self,
        transport: Arc<dyn PlatformTransport>,
        accounts: &PlatformAccounts,
    ) -> Self {
        let mut tiktok = TikTokAdapter::new(transport.clone());
        if let Some(id) = &accounts.tiktok_advertiser_id {
            tiktok = tiktok.with_advertiser_id(id.clone());
        }
        let mut google = GoogleAdapter::new(transport.clone());
        if let Some(id) = &accounts.google_customer_id {
            google = google.with_customer_id(id.clone());
        }

        self.register(Arc::new(MetaAdapter::new(transport)))
            .register(Arc::new(tiktok))
            .register(Arc::new(google))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn build(self) -> PlatformRouter {
        // Attempts against platform APIs are bounded by the api_call timeout
        let retry = self
            .retry
            .with_attempt_timeout(self.timeouts.get_timeout(TimeoutCategory::ApiCall));
        PlatformRouter {
            adapters: self.adapters,
            retry,
            timeouts: self.timeouts,
        }
    }
}

/// Read-only table from platform to adapter
pub struct PlatformRouter {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    retry: RetryPolicy,
    timeouts: TimeoutConfig,
}

impl PlatformRouter {
    pub fn builder() -> PlatformRouterBuilder {
        PlatformRouterBuilder {
            adapters: HashMap::new(),
            retry: RetryPolicy::default(),
            timeouts: TimeoutConfig::default(),
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Registered platforms, in a stable order
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    /// Looks up the adapter for a caller-supplied platform identifier
    pub fn resolve(&self, platform: &str) -> RelayResult<Arc<dyn PlatformAdapter>> {
        let parsed: Platform = platform.parse()?;
        self.adapters
            .get(&parsed)
            .cloned()
            .ok_or_else(|| RelayError::UnknownPlatform(platform.to_string()))
    }

    /// Performs an operation under the retry policy
    ///
    /// An unknown platform fails before any attempt is made.
    pub async fn dispatch(&self, request: &OperationRequest) -> RelayResult<OperationOutcome> {
        let adapter = self.resolve(&request.platform)?;
        let context = request.context();
        let operation = request.operation;
        let params: &Parameters = &request.parameters;

        let outcome = retry_with_backoff(&self.retry, &context, || {
            let adapter = adapter.clone();
            async move { adapter.perform(operation, params).await }
        })
        .await?;

        log::debug!(
            "{} done in {} attempt(s), {:?}",
            context,
            outcome.attempts,
            outcome.elapsed
        );
        Ok(OperationOutcome {
            platform: adapter.platform(),
            operation,
            attempts: outcome.attempts,
            elapsed: outcome.elapsed,
            from_cache: false,
            data: outcome.value,
            persistence_error: None,
        })
    }

    /// Performs an operation and shapes any failure into an error response
    pub async fn execute(
        &self,
        request: &OperationRequest,
    ) -> Result<OperationOutcome, ErrorResponse> {
        self.dispatch(request)
            .await
            .map_err(|err| report(&err, request))
    }
}

/// Logs a terminal failure and builds its error response
pub(crate) fn report(err: &RelayError, request: &OperationRequest) -> ErrorResponse {
    let record = ErrorHandler::handle(err, request.operation.as_str(), Some(&request.platform));
    log::error!(
        "{} failed with {} ({}): {}",
        request.context(),
        record.kind,
        record.code,
        err
    );
    record.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SandboxTransport;

    fn router() -> PlatformRouter {
        PlatformRouter::builder()
            .with_standard_adapters(
                Arc::new(SandboxTransport::new()),
                &PlatformAccounts {
                    tiktok_advertiser_id: Some("7001".into()),
                    google_customer_id: Some("1234567890".into()),
                },
            )
            .build()
    }

    #[test]
    fn test_standard_registration() {
        let router = router();
        assert_eq!(router.platforms(), Platform::ALL.to_vec());
        assert!(router.resolve("facebook").is_ok());
        assert!(matches!(
            router.resolve("snapchat").err(),
            Some(RelayError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn test_unregistered_platform_is_unknown() {
        let router = PlatformRouter::builder()
            .register(Arc::new(MetaAdapter::new(Arc::new(SandboxTransport::new()))))
            .build();
        assert!(router.resolve("meta").is_ok());
        assert!(matches!(
            router.resolve("tiktok").err(),
            Some(RelayError::UnknownPlatform(ref id)) if id == "tiktok"
        ));
    }

    #[test]
    fn test_attempt_timeout_follows_api_call_category() {
        let router = PlatformRouter::builder()
            .with_timeouts(
                TimeoutConfig::default()
                    .with_category(TimeoutCategory::ApiCall, Duration::from_secs(5)),
            )
            .build();
        assert_eq!(router.retry_policy().attempt_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_dispatch_returns_serialized_result() {
        let request = OperationRequest::new(
            "tiktok",
            Operation::PauseAdset,
            Parameters::new().with("adset_id", "1700000000000000009"),
        );
        let outcome = router().dispatch(&request).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.data["object_id"], "1700000000000000009");
        assert_eq!(outcome.data["success"], true);
    }
}
