use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Platform configuration. Loaded from JSON; every field outside the two
/// directories has a sensible default so a minimal config stays minimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Root directory for stored assets.
    pub upload_directory: String,
    /// SQLite database file path. Empty string selects an in-memory
    /// database (tests).
    #[serde(default)]
    pub database_path: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_worker_count() -> usize {
    num_cpus::get().min(4)
}

/// AI gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// API key for the remote service. When absent the stub adapter is used.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Redelivery policy for failed jobs. Off by default: a failed submission is
/// terminal and the recovery path is a fresh submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of automatic re-enqueues after a transient failure. 0 disables
    /// retries entirely.
    #[serde(default)]
    pub max_retries: u32,
}

impl Config {
    pub fn upload_directory(&self) -> PathBuf {
        PathBuf::from(&self.upload_directory)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_directory.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "upload_directory must not be empty".to_string(),
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Validation {
                message: "worker_count must be at least 1".to_string(),
            });
        }
        if self.adapter.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                message: "adapter.timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"version": "1", "upload_directory": "/tmp/uploads"}"#,
        )
        .unwrap();
        assert!(config.worker_count >= 1);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.adapter.model, "gemini-2.5-pro");
        assert_eq!(config.adapter.timeout_secs, 120);
        assert!(config.adapter.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let config: Config = serde_json::from_str(
            r#"{"version": "1", "upload_directory": "/tmp/u", "worker_count": 0}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_upload_directory() {
        let config: Config =
            serde_json::from_str(r#"{"version": "1", "upload_directory": "  "}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_parsed() {
        let config: Config = serde_json::from_str(
            r#"{"version": "1", "upload_directory": "/tmp/u", "retry": {"max_retries": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 3);
    }
}
