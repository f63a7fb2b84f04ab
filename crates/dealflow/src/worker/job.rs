//! Outcome of one pipeline run, handed back to the worker pool.

use crate::queue::Job;
use crate::submission::FailureKind;

#[derive(Debug, Clone)]
pub struct JobResult {
    pub submission_id: String,
    pub attempt: u32,
    pub success: bool,
    /// True when the job referenced a missing or already-terminal
    /// submission and nothing was done.
    pub skipped: bool,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
}

impl JobResult {
    pub fn success(job: &Job) -> Self {
        Self {
            submission_id: job.submission_id.clone(),
            attempt: job.attempt,
            success: true,
            skipped: false,
            error: None,
            failure_kind: None,
        }
    }

    pub fn skipped(job: &Job) -> Self {
        Self {
            submission_id: job.submission_id.clone(),
            attempt: job.attempt,
            success: true,
            skipped: true,
            error: None,
            failure_kind: None,
        }
    }

    pub fn failure(job: &Job, error: String, kind: FailureKind) -> Self {
        Self {
            submission_id: job.submission_id.clone(),
            attempt: job.attempt,
            success: false,
            skipped: false,
            error: Some(error),
            failure_kind: Some(kind),
        }
    }
}
