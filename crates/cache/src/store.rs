//! Key/value store contract and the in-process implementation

use crate::error::{StoreError, StoreResult};
use crate::pattern::KeyPattern;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// One cached value with its write time and lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        value: Value,
        stored_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            stored_at,
            ttl,
        }
    }

    /// Time since the entry was written; zero if `now` is earlier
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Fresh while `now - stored_at <= ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age(now) <= self.ttl
    }
}

/// Storage behind the cache
///
/// Entries past their ttl are kept; the cache decides what stale means.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>>;

    /// Writes an entry, replacing any entry with the same key
    async fn set(&self, entry: CacheEntry) -> StoreResult<()>;

    /// Removes a key, returning whether it existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Keys matching a glob pattern
    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>>;
}

/// HashMap-backed store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

fn poisoned(key: &str) -> StoreError {
    StoreError::operation(key, "memory store lock poisoned")
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned(key))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, entry: CacheEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned(&entry.key))?;
        entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().map_err(|_| poisoned(key))?;
        Ok(entries.remove(key).is_some())
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let matcher = KeyPattern::new(pattern);
        let entries = self.entries.read().map_err(|_| poisoned(pattern))?;
        Ok(entries
            .keys()
            .filter(|key| matcher.matches(key))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(key, json!({"k": key}), at, Duration::from_secs(300))
    }

    #[test]
    fn test_freshness_boundary() {
        let at = Utc::now();
        let e = entry("a", at);
        assert!(e.is_fresh(at + chrono::Duration::seconds(300)));
        assert!(!e.is_fresh(at + chrono::Duration::seconds(301)));
        assert_eq!(e.age(at - chrono::Duration::seconds(5)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.set(entry("campaign:1:meta:status", now)).await.unwrap();
        store.set(entry("campaign:1:tiktok:status", now)).await.unwrap();
        store.set(entry("campaign:2:meta:status", now)).await.unwrap();

        let mut found = store.scan("campaign:1:*").await.unwrap();
        found.sort();
        assert_eq!(found, vec!["campaign:1:meta:status", "campaign:1:tiktok:status"]);

        assert!(store.delete("campaign:2:meta:status").await.unwrap());
        assert!(!store.delete("campaign:2:meta:status").await.unwrap());
        assert!(store.get("campaign:2:meta:status").await.unwrap().is_none());
        assert_eq!(store.len(), 2);
    }
}
