//! Cached reads, invalidating writes and campaign persistence over the router

use crate::router::{report, OperationOutcome, PlatformRouter};
use adrelay_cache::{CacheKey, CacheManager};
use adrelay_core::{
    Budget, CampaignRecord, CampaignResult, CampaignStore, CampaignUpdate, DeliveryStatus,
    ErrorResponse, Operation, OperationRequest, Parameters, Platform, RelayResult, StatusResult,
};
use adrelay_resilience::{retry_with_backoff, RetryPolicy, TimeoutCategory};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Front door used by the orchestrator
///
/// Status reads go through the cache. Any operation that changes a campaign
/// drops that campaign's cache entries and, when a [`CampaignStore`] is
/// attached, records the change there.
pub struct CampaignGateway {
    router: Arc<PlatformRouter>,
    cache: Arc<CacheManager>,
    store: Option<Arc<dyn CampaignStore>>,
    status_ttl: Option<Duration>,
    persistence_retry: RetryPolicy,
}

impl CampaignGateway {
    pub fn new(router: Arc<PlatformRouter>, cache: Arc<CacheManager>) -> Self {
        let persistence_retry = router
            .retry_policy()
            .clone()
            .with_attempt_timeout(router.timeouts().get_timeout(TimeoutCategory::McpCall));
        Self {
            router,
            cache,
            store: None,
            status_ttl: None,
            persistence_retry,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CampaignStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Lifetime of cached statuses; the cache default applies otherwise
    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = Some(ttl);
        self
    }

    pub fn router(&self) -> &PlatformRouter {
        &self.router
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Campaign status, served from the cache while fresh
    ///
    /// When the platform cannot be reached the last known status is returned,
    /// however old.
    pub async fn campaign_status(
        &self,
        platform: &str,
        campaign_id: &str,
    ) -> RelayResult<StatusResult> {
        let request = OperationRequest::new(
            platform,
            Operation::GetStatus,
            Parameters::new().with("campaign_id", campaign_id),
        );
        let outcome = self.read(&request).await?;
        Ok(serde_json::from_value(outcome.data)?)
    }

    /// Performs any operation, caching reads and invalidating after writes
    ///
    /// Once the platform has accepted a change the outcome is returned even if
    /// recording it fails; the failure is reported in
    /// [`OperationOutcome::persistence_error`].
    pub async fn perform(&self, request: &OperationRequest) -> RelayResult<OperationOutcome> {
        if request.operation.is_read() {
            return self.read(request).await;
        }

        let mut outcome = self.router.dispatch(request).await?;
        let campaign_id = affected_campaign(request, &outcome);
        if let Some(campaign_id) = &campaign_id {
            self.invalidate(outcome.platform, campaign_id).await;
        }
        if let Err(e) = self.persist(request, &outcome, campaign_id.as_deref()).await {
            log::error!(
                "{} succeeded on {} but was not recorded: {}",
                request.operation,
                outcome.platform,
                e
            );
            outcome.persistence_error = Some(e.to_string());
        }
        Ok(outcome)
    }

    /// Like [`perform`](Self::perform), with failures shaped for the caller
    pub async fn execute(
        &self,
        request: &OperationRequest,
    ) -> Result<OperationOutcome, ErrorResponse> {
        self.perform(request)
            .await
            .map_err(|err| report(&err, request))
    }

    async fn read(&self, request: &OperationRequest) -> RelayResult<OperationOutcome> {
        // Resolve first so aliases share one cache key and unknown platforms
        // never touch the cache.
        let platform = self.router.resolve(&request.platform)?.platform();
        let campaign_id = request
            .parameters
            .require_str(request.operation.as_str(), "campaign_id")?;
        let key = CacheKey::campaign_status(campaign_id.as_str(), platform.as_str()).to_string();

        let started = Instant::now();
        let attempts = &AtomicU32::new(0);
        let data = self
            .cache
            .get_or_fetch(&key, self.status_ttl, || async move {
                let outcome = self.router.dispatch(request).await?;
                attempts.store(outcome.attempts, Ordering::SeqCst);
                RelayResult::Ok(outcome.data)
            })
            .await?;

        let attempts = attempts.load(Ordering::SeqCst);
        Ok(OperationOutcome {
            platform,
            operation: request.operation,
            attempts,
            elapsed: started.elapsed(),
            from_cache: attempts == 0,
            data,
            persistence_error: None,
        })
    }

    async fn invalidate(&self, platform: Platform, campaign_id: &str) {
        match self
            .cache
            .invalidate_campaign(campaign_id, Some(platform.as_str()))
            .await
        {
            Ok(removed) => log::debug!(
                "dropped {} cache entries for {} campaign {}",
                removed,
                platform,
                campaign_id
            ),
            Err(e) => log::warn!(
                "could not invalidate cache for {} campaign {}: {}",
                platform,
                campaign_id,
                e
            ),
        }
    }

    async fn persist(
        &self,
        request: &OperationRequest,
        outcome: &OperationOutcome,
        campaign_id: Option<&str>,
    ) -> RelayResult<()> {
        let (Some(store), Some(campaign_id)) = (&self.store, campaign_id) else {
            return Ok(());
        };
        let platform = outcome.platform;
        let context = format!("persist.{}", request.operation);

        match request.operation {
            Operation::CreateCampaign => {
                let created: CampaignResult = serde_json::from_value(outcome.data.clone())?;
                let mut record =
                    CampaignRecord::new(platform, campaign_id, created.name, created.status)
                        .with_attributes(request.parameters.clone());
                let budget =
                    Budget::from_parameters(request.operation.as_str(), &request.parameters);
                if let Ok(budget) = budget {
                    record = record.with_budget(budget);
                }
                self.with_retry(&context, || store.create_campaign(record.clone()))
                    .await?;
            }
            Operation::DeleteCampaign => {
                // Campaigns created outside this runtime have no record
                let existing = self
                    .with_retry(&context, || store.fetch_campaign(platform, campaign_id))
                    .await?;
                if existing.is_none() {
                    return Ok(());
                }
                self.with_retry(&context, || {
                    store.update_campaign(
                        platform,
                        campaign_id,
                        CampaignUpdate::status(DeliveryStatus::Deleted),
                    )
                })
                .await?;
            }
            // Ad set and ad changes carry no campaign-level state
            _ => {}
        }
        Ok(())
    }

    async fn with_retry<T, F, Fut>(&self, context: &str, operation: F) -> RelayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RelayResult<T>>,
    {
        Ok(retry_with_backoff(&self.persistence_retry, context, operation)
            .await?
            .value)
    }
}

/// Campaign whose cached state an operation makes stale
fn affected_campaign(request: &OperationRequest, outcome: &OperationOutcome) -> Option<String> {
    match request.operation {
        Operation::CreateCampaign => outcome.data["campaign_id"].as_str().map(str::to_string),
        _ => request.parameters.optional_str("campaign_id"),
    }
}
