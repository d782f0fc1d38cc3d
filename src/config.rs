//! Configuration management for fetchlist
//!
//! Settings are layered: built-in defaults, then an optional TOML settings
//! file, then environment variables, then command-line flags (applied by the
//! CLI). Every field has a default, so an empty or partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{BatchConfig, CacheConfig, ClientConfig, TransferConfig};
use crate::constants::{env, files};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfig,
    /// Per-file transfer thresholds
    pub transfer: TransferConfig,
    /// Download cache settings
    pub cache: CacheConfig,
    /// Batch run settings
    pub batch: BatchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied on top by the caller.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            debug!("Loading config from: {}", path.display());
            config = Self::load_from_file(&path).await?;
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(proxy) = lookup(env::PROXY).filter(|v| !v.trim().is_empty()) {
            debug!("Using proxy from {}", env::PROXY);
            self.client.proxy = Some(proxy.trim().to_string());
        }
        if let Some(dir) = lookup(env::OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            debug!("Using output directory from {}", env::OUTPUT_DIR);
            self.batch.output_dir = PathBuf::from(dir.trim());
        }
    }

    /// Reject settings the downloader cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch.retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.retries".to_string(),
                value: "0".to_string(),
                reason: "at least one attempt per URL is required".to_string(),
            });
        }

        if let Err(problems) = self.transfer.validate() {
            return Err(ConfigError::InvalidValue {
                field: "transfer".to_string(),
                value: format!("{:?}", self.transfer),
                reason: problems.join("; "),
            });
        }

        if self.client.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client.user_agent".to_string(),
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Find the user's settings file, if there is one
    fn find_config_file() -> Option<PathBuf> {
        let path = Self::get_default_config_path()?;
        if path.exists() {
            debug!("Found config file: {}", path.display());
            Some(path)
        } else {
            debug!("No config file found at {}", path.display());
            None
        }
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME).join(files::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.batch.retries, 3);
        assert_eq!(config.batch.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.client.proxy.is_none());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        // Should fail when explicitly specified
        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let test_config = r#"
[client]
connect_timeout = "10s"
proxy = "socks5://127.0.0.1:1080"

[transfer]
progress_interval = "250ms"
low_speed_duration = "1m"

[batch]
retries = 5
keep_old = true

[logging]
level = "debug"
"#;

        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.client.connect_timeout, Duration::from_secs(10));
        assert_eq!(
            config.client.proxy.as_deref(),
            Some("socks5://127.0.0.1:1080")
        );
        assert_eq!(config.transfer.progress_interval, Duration::from_millis(250));
        assert_eq!(config.transfer.low_speed_duration, Duration::from_secs(60));
        assert_eq!(config.batch.retries, 5);
        assert!(config.batch.keep_old);
        assert_eq!(config.logging.level, "debug");

        // Unspecified values keep their defaults
        assert_eq!(config.transfer.buffer_size, 32 * 1024);
        assert_eq!(config.batch.retry_delay_step, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_invalid_toml_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[batch\nretries = ")
            .await
            .unwrap();

        let result = AppConfig::load_from_file(&config_path).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [
            (env::PROXY, "http://proxy.local:3128"),
            (env::OUTPUT_DIR, "/srv/mirror"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.client.proxy.as_deref(), Some("http://proxy.local:3128"));
        assert_eq!(config.batch.output_dir, PathBuf::from("/srv/mirror"));
    }

    #[test]
    fn test_blank_environment_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|_| Some("  ".to_string()));

        assert!(config.client.proxy.is_none());
        assert_eq!(config.batch.output_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn test_validation_rejects_zero_retries() {
        let mut config = AppConfig::default();
        config.batch.retries = 0;

        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "batch.retries"),
            other => panic!("expected invalid retries, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_bad_thresholds() {
        let mut config = AppConfig::default();
        config.transfer.buffer_size = 0;
        config.transfer.min_required_speed = -1.0;

        match config.validate() {
            Err(ConfigError::InvalidValue { field, reason, .. }) => {
                assert_eq!(field, "transfer");
                assert!(reason.contains("buffer_size"));
                assert!(reason.contains("min_required_speed"));
            }
            other => panic!("expected invalid transfer settings, got {:?}", other),
        }
    }
}
