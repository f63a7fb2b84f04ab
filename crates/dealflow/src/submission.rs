//! Submission domain model: lifecycle status, processing stage, and asset
//! references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::StructuredReport;

/// Lifecycle status of a submission.
///
/// Transitions are monotonic (submitted → queued → processing → completed)
/// except `Failed`, which is terminal and never re-enqueued automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Queued,
    Processing,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Queued => "queued",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(SubmissionStatus::Submitted),
            "queued" => Some(SubmissionStatus::Queued),
            "processing" => Some(SubmissionStatus::Processing),
            "completed" => Some(SubmissionStatus::Completed),
            "failed" => Some(SubmissionStatus::Failed),
            _ => None,
        }
    }

    /// True when the submission can no longer change state on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Failed)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-step of the `processing` status. Meaningful only while a worker owns
/// the submission; ignored in any other status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Ingestion,
    AiAnalysis,
    ReportGeneration,
    Completion,
}

impl ProcessingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::Ingestion => "ingestion",
            ProcessingStage::AiAnalysis => "ai_analysis",
            ProcessingStage::ReportGeneration => "report_generation",
            ProcessingStage::Completion => "completion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ingestion" => Some(ProcessingStage::Ingestion),
            "ai_analysis" => Some(ProcessingStage::AiAnalysis),
            "report_generation" => Some(ProcessingStage::ReportGeneration),
            "completion" => Some(ProcessingStage::Completion),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal category recorded on a failed submission, alongside the
/// human-readable cause. Informational only — nothing is retried based on it
/// unless retries are explicitly configured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    AssetResolution,
    Transient,
    Permanent,
    InvalidInput,
    Repository,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::AssetResolution => "asset_resolution",
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::Repository => "repository",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asset_resolution" => Some(FailureKind::AssetResolution),
            "transient" => Some(FailureKind::Transient),
            "permanent" => Some(FailureKind::Permanent),
            "invalid_input" => Some(FailureKind::InvalidInput),
            "repository" => Some(FailureKind::Repository),
            _ => None,
        }
    }

    /// Whether a future identical attempt might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::Transient)
    }
}

/// Declared category of an uploaded asset. Drives the storage subfolder and
/// the static validation tables in the asset store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    PitchDeck,
    VideoPitch,
    AudioPitch,
    FinancialModel,
    ProductDemo,
    FounderUpdate,
    SupportingDocument,
    Image,
    Document,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::PitchDeck => "pitch_deck",
            AssetCategory::VideoPitch => "video_pitch",
            AssetCategory::AudioPitch => "audio_pitch",
            AssetCategory::FinancialModel => "financial_model",
            AssetCategory::ProductDemo => "product_demo",
            AssetCategory::FounderUpdate => "founder_update",
            AssetCategory::SupportingDocument => "supporting_document",
            AssetCategory::Image => "image",
            AssetCategory::Document => "document",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one stored asset. The storage key is assigned by the asset
/// store, is independent of the declared name, and stays stable for the
/// object's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub category: AssetCategory,
    /// Relative storage key inside the upload directory.
    pub storage_key: String,
    /// Name the founder gave the file. Display only.
    pub declared_name: String,
    pub size: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A founder's startup-evaluation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub id: String,
    /// Identifier of the founder who created the submission.
    pub owner_id: String,
    /// Founder-entered structured fields. Opaque to the pipeline; passed
    /// through to the AI gateway unmodified.
    pub payload: serde_json::Value,
    /// Ordered list of uploaded asset references. Frozen once queued.
    #[serde(default)]
    pub assets: Vec<AssetRef>,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<ProcessingStage>,
    /// Short human-readable cause, set when status is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Populated exactly once, together with status=`completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<StructuredReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Creates a fresh submission in `submitted` status.
    pub fn new(owner_id: &str, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            payload,
            assets: Vec::new(),
            status: SubmissionStatus::Submitted,
            stage: None,
            failure_cause: None,
            failure_kind: None,
            report: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Best-effort company name from the payload, for logs and report echo.
    pub fn company_name(&self) -> Option<&str> {
        self.payload.get("startupName").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SubmissionStatus::Submitted,
            SubmissionStatus::Queued,
            SubmissionStatus::Processing,
            SubmissionStatus::Completed,
            SubmissionStatus::Failed,
        ] {
            assert_eq!(SubmissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::parse("retrying"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SubmissionStatus::Completed.is_terminal());
        assert!(SubmissionStatus::Failed.is_terminal());
        assert!(!SubmissionStatus::Processing.is_terminal());
        assert!(!SubmissionStatus::Queued.is_terminal());
    }

    #[test]
    fn test_stage_roundtrip() {
        for stage in [
            ProcessingStage::Ingestion,
            ProcessingStage::AiAnalysis,
            ProcessingStage::ReportGeneration,
            ProcessingStage::Completion,
        ] {
            assert_eq!(ProcessingStage::parse(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn test_failure_kind_transient() {
        assert!(FailureKind::Transient.is_transient());
        assert!(!FailureKind::Permanent.is_transient());
        assert!(!FailureKind::AssetResolution.is_transient());
    }

    #[test]
    fn test_new_submission_defaults() {
        let sub = Submission::new("founder-1", serde_json::json!({"startupName": "HyperPay"}));
        assert!(!sub.id.is_empty());
        assert_eq!(sub.owner_id, "founder-1");
        assert_eq!(sub.status, SubmissionStatus::Submitted);
        assert!(sub.stage.is_none());
        assert!(sub.report.is_none());
        assert!(sub.assets.is_empty());
        assert_eq!(sub.company_name(), Some("HyperPay"));
        assert_eq!(sub.created_at, sub.updated_at);
    }

    #[test]
    fn test_company_name_missing() {
        let sub = Submission::new("founder-1", serde_json::json!({}));
        assert_eq!(sub.company_name(), None);
    }
}
