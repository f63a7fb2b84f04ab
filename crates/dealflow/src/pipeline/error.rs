use thiserror::Error;

use crate::adapter::AdapterError;
use crate::submission::FailureKind;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A referenced asset could not be read back from storage.
    #[error("Asset resolution failed: {0}")]
    AssetResolution(crate::error::StorageError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AdapterError),

    #[error("Repository access failed: {0}")]
    Repository(#[from] crate::db::DatabaseError),
}

impl PipelineError {
    /// The failure category recorded on the submission.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PipelineError::AssetResolution(_) => FailureKind::AssetResolution,
            PipelineError::Analysis(AdapterError::Transient(_)) => FailureKind::Transient,
            PipelineError::Analysis(AdapterError::Permanent(_)) => FailureKind::Permanent,
            PipelineError::Analysis(AdapterError::InvalidInput(_)) => FailureKind::InvalidInput,
            PipelineError::Repository(_) => FailureKind::Repository,
        }
    }
}
