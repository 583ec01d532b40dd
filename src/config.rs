use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Main configuration structure for the FastLease workflow tools
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FastLeaseConfig {
    /// Workflow identity settings
    pub workflow: WorkflowConfig,
    /// Retry policy for risky operations
    pub retry: RetryConfig,
    /// Webhook delivery settings
    pub webhooks: WebhookConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Prefix for generated workflow ids
    pub id_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Receivers notified of workflow events
    pub endpoints: Vec<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Attempts per endpoint
    pub max_retries: u32,
    /// Fixed wait after a transport failure
    pub retry_delay_ms: u64,
    /// Extra request headers
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            id_prefix: "wf".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            timeout_seconds: 10,
            max_retries: 3,
            retry_delay_ms: 1000,
            headers: HashMap::new(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_factor: self.backoff_factor,
        }
    }
}

impl FastLeaseConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (fastlease.toml, .fastlease-rc)
    /// 3. Environment variables (prefixed with FASTLEASE__, e.g. FASTLEASE__RETRY__MAX_ATTEMPTS)
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Same as [`FastLeaseConfig::load`], with an explicit file layered above
    /// the default files
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&FastLeaseConfig::default())?);

        if Path::new("fastlease.toml").exists() {
            builder = builder.add_source(File::with_name("fastlease"));
        }

        if Path::new(".fastlease-rc").exists() {
            builder = builder.add_source(
                File::with_name(".fastlease-rc").format(config::FileFormat::Toml),
            );
        }

        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("FASTLEASE")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("webhooks.endpoints")
                .try_parsing(true),
        );

        let config: FastLeaseConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the components cannot run with
    pub fn validate(&self) -> Result<()> {
        self.retry.to_policy().validate()?;

        if self.webhooks.max_retries == 0 {
            bail!("webhooks.max_retries must be at least 1");
        }
        if self.webhooks.timeout_seconds == 0 {
            bail!("webhooks.timeout_seconds must be at least 1");
        }
        for endpoint in &self.webhooks.endpoints {
            let url = reqwest::Url::parse(endpoint)
                .map_err(|e| anyhow::anyhow!("Invalid webhook endpoint '{}': {}", endpoint, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Webhook endpoint '{}' must use http or https", endpoint);
            }
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = FastLeaseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.to_policy(), RetryPolicy::default());
        assert_eq!(config.webhooks.max_retries, 3);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[retry]
max_attempts = 5
base_delay_ms = 500

[webhooks]
endpoints = ["https://hooks.example.com/fastlease"]
"#,
        )
        .unwrap();

        let config = FastLeaseConfig::load_with(Some(&path)).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(config.retry.max_delay_ms, 60_000);
        assert_eq!(
            config.webhooks.endpoints,
            vec!["https://hooks.example.com/fastlease".to_string()]
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(FastLeaseConfig::load_with(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_save_round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fastlease.toml");
        let mut config = FastLeaseConfig::default();
        config.observability.json_logs = true;
        config.webhooks.headers.insert("X-Api-Key".to_string(), "secret".to_string());

        config.save_to_file(&path).unwrap();
        let loaded = FastLeaseConfig::load_with(Some(&path)).unwrap();
        assert!(loaded.observability.json_logs);
        // Keys may come back lowercased by the config loader
        let api_key = loaded
            .webhooks
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("x-api-key"))
            .map(|(_, value)| value.as_str());
        assert_eq!(api_key, Some("secret"));
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        let mut config = FastLeaseConfig::default();
        config.retry.backoff_factor = 0.5;
        assert!(config.validate().is_err());

        let mut config = FastLeaseConfig::default();
        config.webhooks.endpoints = vec!["ftp://files.example.com".to_string()];
        assert!(config.validate().is_err());

        let mut config = FastLeaseConfig::default();
        config.webhooks.max_retries = 0;
        assert!(config.validate().is_err());
    }
}
