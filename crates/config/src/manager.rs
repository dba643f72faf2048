//! Configuration manager - main API for config operations

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::str::FromStr;

const ENV_PREFIX: &str = "ADRELAY";

/// Main configuration manager
///
/// Owns the config file location and the load/save/override chain.
pub struct ConfigManager {
    file: ConfigFile,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/adrelay/`
    /// - macOS: `~/Library/Application Support/adrelay/`
    /// - Windows: `%APPDATA%\adrelay\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self {
            file: ConfigFile::new(config_dir.join("config.toml")),
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "adrelay")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.read()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Saves the configuration to file
    ///
    /// Invalid configurations are refused. The write is atomic.
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Loads the current config, applies `update_fn` and saves the result
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use adrelay_config::ConfigManager;
    /// # fn main() -> Result<(), adrelay_config::ConfigError> {
    /// let manager = ConfigManager::new()?;
    /// manager.update(|config| {
    ///     config.retry.max_retries = 5;
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Generates a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.file.write_annotated(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the config file with default values
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the current configuration file
    ///
    /// Returns all validation errors found, or an empty list if valid.
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies process environment overrides
    ///
    /// Variables follow the pattern `ADRELAY_<SECTION>_<FIELD>`, for example
    /// `ADRELAY_RETRY_MAX_RETRIES=5` or `ADRELAY_ACCOUNTS_GOOGLE_CUSTOMER_ID`.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        self.load_with_overrides(|var| std::env::var(var).ok())
    }

    /// Like [`load_with_env_overrides`](Self::load_with_env_overrides), reading
    /// variables through `lookup`
    pub fn load_with_overrides<F>(&self, lookup: F) -> ConfigResult<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load()?;
        apply_overrides(&mut config, &lookup)?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn apply_overrides<F>(config: &mut Config, lookup: &F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let retry = &mut config.retry;
    override_value(lookup, "RETRY_MAX_RETRIES", &mut retry.max_retries)?;
    override_value(lookup, "RETRY_BASE_DELAY_MS", &mut retry.base_delay_ms)?;
    override_value(lookup, "RETRY_BACKOFF_FACTOR", &mut retry.backoff_factor)?;
    override_value(lookup, "RETRY_TOTAL_TIMEOUT_SECS", &mut retry.total_timeout_secs)?;

    let timeouts = &mut config.timeouts;
    override_value(lookup, "TIMEOUTS_API_CALL_SECS", &mut timeouts.api_call_secs)?;
    override_value(lookup, "TIMEOUTS_MCP_CALL_SECS", &mut timeouts.mcp_call_secs)?;
    override_value(lookup, "TIMEOUTS_AI_GENERATION_SECS", &mut timeouts.ai_generation_secs)?;
    override_value(lookup, "TIMEOUTS_DEFAULT_SECS", &mut timeouts.default_secs)?;

    let cache = &mut config.cache;
    override_value(lookup, "CACHE_DEFAULT_TTL_SECS", &mut cache.default_ttl_secs)?;
    override_value(lookup, "CACHE_STATUS_TTL_SECS", &mut cache.status_ttl_secs)?;

    let accounts = &mut config.accounts;
    if let Some(id) = lookup(&env_var("ACCOUNTS_TIKTOK_ADVERTISER_ID")) {
        accounts.tiktok_advertiser_id = Some(id);
    }
    if let Some(id) = lookup(&env_var("ACCOUNTS_GOOGLE_CUSTOMER_ID")) {
        accounts.google_customer_id = Some(id);
    }
    Ok(())
}

fn override_value<F, T>(lookup: &F, suffix: &str, target: &mut T) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let var = env_var(suffix);
    let Some(raw) = lookup(&var) else {
        return Ok(());
    };
    *target = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::BadOverride {
            var: var.clone(),
            value: raw.clone(),
        })?;
    log::debug!("{} overrides config file", var);
    Ok(())
}

fn env_var(suffix: &str) -> String {
    format!("{ENV_PREFIX}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        let config = manager.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupt_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[retry\nmax_retries = ").expect("Should write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| {
                config.cache.status_ttl_secs = 60;
            })
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.cache.status_ttl_secs, 60);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.retry.max_retries = 0;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_validate_reports_hand_edited_errors() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[cache]\ndefault_ttl_secs = 0\n")
            .expect("Should write");

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("cache.default_ttl_secs"));
    }

    #[test]
    fn test_env_overrides() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        let config = manager
            .load_with_overrides(vars(&[
                ("ADRELAY_RETRY_MAX_RETRIES", "5"),
                ("ADRELAY_TIMEOUTS_API_CALL_SECS", " 12 "),
                ("ADRELAY_ACCOUNTS_TIKTOK_ADVERTISER_ID", "7001"),
            ]))
            .expect("Should load with overrides");

        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.timeouts.api_call_secs, 12);
        assert_eq!(config.accounts.tiktok_advertiser_id.as_deref(), Some("7001"));
        assert_eq!(config.cache, crate::CacheConfig::default());
    }

    #[test]
    fn test_unparseable_env_override_is_an_error() {
        let (_temp_dir, manager) = setup_test_manager();

        let result = manager.load_with_overrides(vars(&[("ADRELAY_CACHE_DEFAULT_TTL_SECS", "5m")]));
        assert!(matches!(
            result,
            Err(ConfigError::BadOverride { ref var, .. }) if var == "ADRELAY_CACHE_DEFAULT_TTL_SECS"
        ));
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}
