//! AI gateway adapters.
//!
//! The pipeline talks to an [`AnalysisProvider`]; the concrete provider is
//! chosen from configuration. Deployments without an API key fall back to
//! the deterministic [`StubAdapter`], which keeps the rest of the system
//! fully exercisable offline.

pub mod gemini;
pub mod stub;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::report::{Insights, Scores};
use crate::submission::AssetCategory;

pub use gemini::GeminiAdapter;
pub use stub::StubAdapter;

/// Adapter failures, classified by whether a retry could help.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Timeout, connection failure, rate limit or upstream 5xx. A later
    /// identical attempt might succeed.
    #[error("Transient analysis failure: {0}")]
    Transient(String),

    /// Rejected request or unusable response. Retrying will not help.
    #[error("Permanent analysis failure: {0}")]
    Permanent(String),

    /// The request itself was malformed before it left the process.
    #[error("Invalid analysis input: {0}")]
    InvalidInput(String),
}

impl AdapterError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AdapterError::Transient(_))
    }
}

/// One resolved asset handed to the provider.
#[derive(Debug)]
pub struct AnalysisAsset {
    pub category: AssetCategory,
    pub declared_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything a provider needs to evaluate one submission.
#[derive(Debug)]
pub struct AnalysisRequest {
    pub submission_id: String,
    pub company_name: Option<String>,
    /// Founder-entered fields, passed through unmodified.
    pub payload: Value,
    pub assets: Vec<AnalysisAsset>,
}

/// Provider output, not yet stamped into a persisted report.
#[derive(Debug)]
pub struct AnalysisOutput {
    pub scores: Scores,
    pub insights: Insights,
    /// Provider-defined fields outside the known schema, preserved verbatim.
    pub extra: Map<String, Value>,
}

/// Seam between the pipeline and the external AI service.
pub trait AnalysisProvider: Send + Sync {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, AdapterError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Picks the provider for a deployment: Gemini when an API key is
/// configured, otherwise the stub.
pub fn provider_from_config(
    config: &crate::config::AdapterConfig,
) -> Result<std::sync::Arc<dyn AnalysisProvider>, AdapterError> {
    match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(std::sync::Arc::new(
            GeminiAdapter::from_config(config, key.to_string())?,
        )),
        _ => {
            log::info!("No API key configured; using the stub analysis provider");
            Ok(std::sync::Arc::new(StubAdapter::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;

    #[test]
    fn test_provider_selection_follows_api_key() {
        let mut config = AdapterConfig::default();
        assert_eq!(provider_from_config(&config).unwrap().name(), "stub");

        config.api_key = Some("   ".to_string());
        assert_eq!(provider_from_config(&config).unwrap().name(), "stub");

        config.api_key = Some("test-key".to_string());
        assert_eq!(provider_from_config(&config).unwrap().name(), "gemini");
    }
}
