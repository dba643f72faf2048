//! Reading and writing `config.toml`
//!
//! Writes go through a temp file in the same directory and a rename, after
//! copying the current file to `config.toml.backup`.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HEADER: &str = "\
# adrelay configuration
#
# Any value can be overridden with ADRELAY_<SECTION>_<FIELD>,
# e.g. ADRELAY_RETRY_MAX_RETRIES=5 or ADRELAY_CACHE_DEFAULT_TTL_SECS=600.

";

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// A missing file reads as defaults. Out-of-range values are only
    /// logged, so a hand-edited file can still be loaded and repaired.
    pub fn read(&self) -> ConfigResult<Config> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(ConfigError::io("read", &self.path, e)),
        };

        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} is format version {}, newer than {}; unknown keys are ignored",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("{}: {}", self.path.display(), error);
            }
        }
        Ok(config)
    }

    pub fn write(&self, config: &Config) -> ConfigResult<()> {
        let text = config.to_toml_string()?;
        self.replace(config, &text)
    }

    /// Like [`write`](Self::write), with a comment block explaining overrides
    pub fn write_annotated(&self, config: &Config) -> ConfigResult<()> {
        let text = format!("{HEADER}{}", config.to_toml_string()?);
        self.replace(config, &text)
    }

    fn replace(&self, config: &Config, text: &str) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| ConfigError::io("create", dir, e))?;

        if self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|e| ConfigError::io("back up", &self.path, e))?;
            log::debug!("previous config kept at {}", backup.display());
        }

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| ConfigError::io("stage", dir, e))?;
        staged
            .write_all(text.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|e| ConfigError::io("write", staged.path(), e))?;
        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::io("replace", &self.path, e.error))?;

        log::info!("saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_file() -> (TempDir, ConfigFile) {
        let dir = TempDir::new().expect("temp dir");
        let file = ConfigFile::new(dir.path().join("config.toml"));
        (dir, file)
    }

    #[test]
    fn test_missing_file_reads_as_defaults_without_creating_it() {
        let (_dir, file) = config_file();
        assert_eq!(file.read().unwrap(), Config::default());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_blank_file_is_damaged() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "\n   \n").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_malformed_file_names_its_path() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "[retry\nmax_retries = ").unwrap();

        let err = file.read().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == file.path()));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_out_of_range_file_still_loads() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "[retry]\nbackoff_factor = 0\n").unwrap();
        assert_eq!(file.read().unwrap().retry.backoff_factor, 0);
    }

    #[test]
    fn test_invalid_config_leaves_file_untouched() {
        let (_dir, file) = config_file();
        let mut saved = Config::default();
        saved.accounts.google_customer_id = Some("123-456-7890".into());
        file.write(&saved).unwrap();

        let mut bad = saved.clone();
        bad.timeouts.api_call_secs = 0;
        bad.cache.status_ttl_secs = 0;
        match file.write(&bad) {
            Err(ConfigError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert_eq!(file.read().unwrap(), saved);
        assert!(!file.backup_path().exists());
    }

    #[test]
    fn test_overwrite_keeps_previous_as_backup() {
        let (_dir, file) = config_file();
        let mut first = Config::default();
        first.retry.max_retries = 1;
        file.write(&first).unwrap();
        file.write(&Config::default()).unwrap();

        let backup = fs::read_to_string(file.backup_path()).unwrap();
        let backup: Config = toml::from_str(&backup).unwrap();
        assert_eq!(backup.retry.max_retries, 1);
        assert_eq!(file.read().unwrap(), Config::default());
    }

    #[test]
    fn test_nested_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("adrelay").join("config.toml"));
        file.write(&Config::default()).unwrap();
        assert!(file.path().is_file());
    }

    #[test]
    fn test_annotated_file_reads_back() {
        let (_dir, file) = config_file();
        file.write_annotated(&Config::default()).unwrap();

        let text = fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("# adrelay configuration"));
        assert!(text.contains("ADRELAY_RETRY_MAX_RETRIES"));
        assert_eq!(file.read().unwrap(), Config::default());
    }
}
