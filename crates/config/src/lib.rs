//! adrelay configuration
//!
//! Settings live in one TOML file split into sections. Each section is a type
//! implementing [`ConfigSection`], so it validates itself.
//!
//! - Missing files load as defaults; corrupt files are reported
//! - Writes are atomic and keep the previous file as `config.toml.backup`
//! - `ADRELAY_<SECTION>_<FIELD>` environment variables override file values
//!
//! # Example
//!
//! ```rust
//! use adrelay_config::{Config, ConfigManager};
//!
//! let dir = tempfile::tempdir().expect("temp dir");
//! let manager = ConfigManager::with_directory(dir.path().to_path_buf()).expect("manager");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! assert_eq!(config.retry.to_policy().max_attempts(), 4);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
mod accounts_config;
mod cache_config;
mod retry_config;
mod timeout_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use accounts_config::AccountsConfig;
pub use cache_config::CacheConfig;
pub use retry_config::RetryConfig;
pub use timeout_config::TimeoutsConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Retry behaviour around upstream calls
    pub retry: RetryConfig,

    /// Per-category call timeouts
    pub timeouts: TimeoutsConfig,

    /// Cache lifetimes
    pub cache: CacheConfig,

    /// Platform account ids
    pub accounts: AccountsConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_section(&self.retry, &mut errors);
        check_section(&self.timeouts, &mut errors);
        check_section(&self.cache, &mut errors);
        check_section(&self.accounts, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Renders the configuration as it would be written to disk
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn check_section<S: ConfigSection>(section: &S, errors: &mut Vec<ValidationError>) {
    if let Err(mut found) = section.validate() {
        log::debug!("[{}] has {} invalid value(s)", section.section_name(), found.len());
        errors.append(&mut found);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            retry: RetryConfig::default(),
            timeouts: TimeoutsConfig::default(),
            cache: CacheConfig::default(),
            accounts: AccountsConfig::default(),
        }
    }
}
