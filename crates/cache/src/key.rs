//! Cache key convention: `{entity}:{entity_id}:{platform}:{facet}`
//!
//! Segments are percent-encoded, so an id holding `:`, `*` or `?` can neither
//! split a key nor act as a wildcard.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entity: String,
    entity_id: String,
    platform: Option<String>,
    facet: Option<String>,
}

impl CacheKey {
    pub fn new(entity: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            entity_id: entity_id.into(),
            platform: None,
            facet: None,
        }
    }

    pub fn campaign(campaign_id: impl Into<String>) -> Self {
        Self::new("campaign", campaign_id)
    }

    /// Key under which a campaign's delivery status is cached
    pub fn campaign_status(campaign_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::campaign(campaign_id)
            .with_platform(platform)
            .with_facet("status")
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    /// Pattern matching every key below this one
    pub fn prefix_pattern(&self) -> String {
        let mut pattern = format!("{}:{}:", segment(&self.entity), segment(&self.entity_id));
        if let Some(platform) = &self.platform {
            pattern.push_str(&segment(platform));
            pattern.push(':');
        }
        pattern.push('*');
        pattern
    }
}

fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", segment(&self.entity), segment(&self.entity_id))?;
        if let Some(platform) = &self.platform {
            write!(f, ":{}", segment(platform))?;
        }
        if let Some(facet) = &self.facet {
            write!(f, ":{}", segment(facet))?;
        }
        Ok(())
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{is_pattern, key_matches};

    #[test]
    fn test_key_format() {
        assert_eq!(
            CacheKey::campaign_status("123", "meta").to_string(),
            "campaign:123:meta:status"
        );
        assert_eq!(
            CacheKey::new("adset", "9").with_facet("insights").to_string(),
            "adset:9:insights"
        );
    }

    #[test]
    fn test_prefix_patterns() {
        let all = CacheKey::campaign("123").prefix_pattern();
        let meta = CacheKey::campaign("123").with_platform("meta").prefix_pattern();
        assert_eq!(all, "campaign:123:*");
        assert_eq!(meta, "campaign:123:meta:*");

        assert!(key_matches(&all, "campaign:123:tiktok:status"));
        assert!(key_matches(&meta, "campaign:123:meta:status"));
        assert!(!key_matches(&meta, "campaign:123:tiktok:status"));
    }

    #[test]
    fn test_wildcards_in_ids_are_encoded() {
        let odd = CacheKey::campaign_status("12*", "meta").to_string();
        assert_eq!(odd, "campaign:12%2A:meta:status");
        assert!(!is_pattern(&odd));

        let pattern = CacheKey::campaign("1?").prefix_pattern();
        assert_eq!(pattern, "campaign:1%3F:*");
        assert!(!key_matches(&pattern, "campaign:12:meta:status"));
        assert!(key_matches(&pattern, &CacheKey::campaign_status("1?", "meta").to_string()));
    }

    #[test]
    fn test_colon_in_id_stays_one_segment() {
        let key = CacheKey::campaign_status("customers/1:2", "google").to_string();
        assert_eq!(key, "campaign:customers%2F1%3A2:google:status");
        assert!(!key_matches(&CacheKey::campaign("customers/1").prefix_pattern(), &key));
    }
}
