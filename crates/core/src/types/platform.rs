//! Advertising platform identifiers

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An advertising platform the runtime can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Meta,
    TikTok,
    Google,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Meta, Platform::TikTok, Platform::Google];

    /// Identifier used in requests and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Meta => "meta",
            Platform::TikTok => "tiktok",
            Platform::Google => "google",
        }
    }

    /// Name shown to end users
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Meta => "Meta",
            Platform::TikTok => "TikTok",
            Platform::Google => "Google Ads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meta" | "facebook" => Ok(Platform::Meta),
            "tiktok" => Ok(Platform::TikTok),
            "google" | "google_ads" => Ok(Platform::Google),
            _ => Err(RelayError::UnknownPlatform(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_platforms() {
        assert_eq!("meta".parse::<Platform>().ok(), Some(Platform::Meta));
        assert_eq!("Facebook".parse::<Platform>().ok(), Some(Platform::Meta));
        assert_eq!(" tiktok ".parse::<Platform>().ok(), Some(Platform::TikTok));
        assert_eq!("google_ads".parse::<Platform>().ok(), Some(Platform::Google));
    }

    #[test]
    fn test_parse_unknown_platform() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert!(matches!(err, RelayError::UnknownPlatform(ref id) if id == "myspace"));
    }

    #[test]
    fn test_identifiers_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().ok(), Some(platform));
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Platform::TikTok).unwrap();
        assert_eq!(json, "\"tiktok\"");
    }
}
