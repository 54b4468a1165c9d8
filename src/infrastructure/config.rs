//! Configuration loading.
//!
//! Hierarchical configuration using figment: programmatic defaults, a
//! project-local YAML file, then environment variable overrides.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_retries: {0}. Must be between 1 and 10")]
    InvalidMaxRetries(u32),

    #[error("Invalid watcher retry_interval_ms: must be positive")]
    InvalidWatcherInterval,

    #[error(
        "Invalid process wait configuration: poll_interval_secs ({0}) must be positive and less than timeout_secs ({1})"
    )]
    InvalidProcessWait(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Scripts directory cannot be empty")]
    EmptyScriptsDir,
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.buildmend/config.yaml` (project config)
    /// 3. Environment variables (`BUILDMEND_*` prefix)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".buildmend/config.yaml"))
            .merge(Env::prefixed("BUILDMEND_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.max_retries == 0 || config.max_retries > 10 {
            return Err(ConfigError::InvalidMaxRetries(config.max_retries));
        }

        if config.watcher.retry_interval_ms == 0 {
            return Err(ConfigError::InvalidWatcherInterval);
        }

        if config.process_wait.poll_interval_secs == 0
            || config.process_wait.poll_interval_secs >= config.process_wait.timeout_secs
        {
            return Err(ConfigError::InvalidProcessWait(
                config.process_wait.poll_interval_secs,
                config.process_wait.timeout_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.scripts.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyScriptsDir);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_validates() {
        ConfigLoader::validate(&Config::default()).unwrap();
    }

    #[test]
    fn rejects_zero_max_retries() {
        let mut config = Config::default();
        config.max_retries = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRetries(0))
        ));
    }

    #[test]
    fn rejects_poll_interval_at_or_over_timeout() {
        let mut config = Config::default();
        config.process_wait.poll_interval_secs = 10;
        config.process_wait.timeout_secs = 10;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProcessWait(10, 10))
        ));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "max_retries: 5\npreferences:\n  allow_cleaning: false\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.max_retries, 5);
        assert!(!config.preferences.allow_cleaning);
        assert!(config.preferences.allow_resolving_packages);
    }

    #[test]
    fn invalid_yaml_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "max_retries: 99\n").unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
