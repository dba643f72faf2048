//! Cache-aside layer for platform reads
//!
//! This crate provides:
//! - [`CacheManager`]: read-through with TTL, stale fallback on fetch failure
//!   and glob invalidation
//! - [`KeyValueStore`]: the storage contract, with [`MemoryStore`] as the
//!   in-process implementation
//! - [`CacheKey`]: the `{entity}:{entity_id}:{platform}:{facet}` convention
//!
//! # Example
//!
//! ```rust
//! use adrelay_cache::{CacheKey, CacheManager, MemoryStore};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = CacheManager::new(Arc::new(MemoryStore::new()));
//! let key = CacheKey::campaign_status("123", "meta").to_string();
//!
//! let status: String = cache
//!     .get_or_fetch(&key, None, || async { Ok::<_, String>("ACTIVE".to_string()) })
//!     .await
//!     .unwrap();
//! assert_eq!(status, "ACTIVE");
//! # }
//! ```

mod clock;
mod error;
mod key;
mod manager;
mod pattern;
mod stats;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use key::CacheKey;
pub use manager::{CacheManager, DEFAULT_TTL};
pub use pattern::{is_pattern, key_matches, KeyPattern};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{CacheEntry, KeyValueStore, MemoryStore};
