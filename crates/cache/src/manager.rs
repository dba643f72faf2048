//! Cache-aside reads with stale fallback

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::key::CacheKey;
use crate::pattern::is_pattern;
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::store::{CacheEntry, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Lifetime of an entry when the caller gives none
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Read-through cache over an injected [`KeyValueStore`]
///
/// Store failures never fail a read: a broken store behaves like an empty
/// one and failed writes are logged and dropped.
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    stats: CacheStats,
}

impl CacheManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            default_ttl: DEFAULT_TTL,
            stats: CacheStats::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the cached value for `key`, calling `fetch` when it is absent
    /// or expired
    ///
    /// A successful fetch overwrites the entry. A failed fetch falls back to
    /// the expired value when there is one; otherwise the fetch error is
    /// returned as is.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let now = self.clock.now();
        let mut stale = None;

        match self.store.get(key).await {
            Ok(Some(entry)) => match serde_json::from_value::<T>(entry.value.clone()) {
                Ok(value) if entry.is_fresh(now) => {
                    log::debug!("cache hit for {}", key);
                    self.stats.record_hit();
                    return Ok(value);
                }
                Ok(value) => {
                    log::debug!(
                        "cache entry for {} expired {}s ago",
                        key,
                        entry.age(now).saturating_sub(entry.ttl).as_secs()
                    );
                    stale = Some(value);
                }
                Err(e) => log::warn!("ignoring undecodable cache entry for {}: {}", key, e),
            },
            Ok(None) => log::debug!("cache miss for {}", key),
            Err(e) => {
                self.stats.record_store_error();
                log::warn!("cache read for {} failed, fetching instead: {}", key, e);
            }
        }
        self.stats.record_miss();

        match fetch().await {
            Ok(value) => {
                if let Err(e) = self.write(key, &value, ttl).await {
                    self.stats.record_store_error();
                    log::warn!("cache write for {} failed: {}", key, e);
                }
                Ok(value)
            }
            Err(e) => match stale {
                Some(value) => {
                    self.stats.record_stale();
                    log::warn!("fetch for {} failed, serving stale value: {}", key, e);
                    Ok(value)
                }
                None => Err(e),
            },
        }
    }

    /// Fresh value for `key`, without fetching
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let now = self.clock.now();
        match self.store.get(key).await? {
            Some(entry) if entry.is_fresh(now) => serde_json::from_value(entry.value)
                .map(Some)
                .map_err(|source| StoreError::Encoding {
                    key: key.to_string(),
                    source,
                }),
            _ => Ok(None),
        }
    }

    /// Writes a value through to the store
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        self.write(key, value, ttl).await
    }

    async fn write<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encoding {
            key: key.to_string(),
            source,
        })?;
        let entry = CacheEntry::new(
            key,
            value,
            self.clock.now(),
            ttl.unwrap_or(self.default_ttl),
        );
        self.store.set(entry).await
    }

    /// Deletes one key, or every key matching a glob pattern
    ///
    /// Returns how many entries were removed.
    pub async fn invalidate(&self, key_or_pattern: &str) -> StoreResult<usize> {
        if !is_pattern(key_or_pattern) {
            let removed = usize::from(self.store.delete(key_or_pattern).await?);
            log::debug!("invalidated {} ({} removed)", key_or_pattern, removed);
            return Ok(removed);
        }

        let mut removed = 0;
        for key in self.store.scan(key_or_pattern).await? {
            if self.store.delete(&key).await? {
                removed += 1;
            }
        }
        log::debug!("invalidated {} ({} removed)", key_or_pattern, removed);
        Ok(removed)
    }

    /// Drops everything cached for a campaign, optionally on one platform only
    pub async fn invalidate_campaign(
        &self,
        campaign_id: &str,
        platform: Option<&str>,
    ) -> StoreResult<usize> {
        let key = match platform {
            Some(platform) => CacheKey::campaign(campaign_id).with_platform(platform),
            None => CacheKey::campaign(campaign_id),
        };
        self.invalidate(&key.prefix_pattern()).await
    }
}
