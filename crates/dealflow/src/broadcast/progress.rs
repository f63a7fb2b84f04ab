//! Progress broadcaster for streaming submission status changes.
//!
//! Outbound layers (SSE, websockets) subscribe here; the pipeline publishes
//! one event per status or stage transition. Lossy by design: events with no
//! subscriber are dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::submission::{ProcessingStage, SubmissionStatus};

/// One status-change event for a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingEvent {
    pub submission_id: String,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<ProcessingStage>,
    /// Human-readable description of the current activity.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Failure cause (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingEvent {
    pub fn stage(submission_id: &str, stage: ProcessingStage, message: &str) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            status: SubmissionStatus::Processing,
            stage: Some(stage),
            message: message.to_string(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn completed(submission_id: &str) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            status: SubmissionStatus::Completed,
            stage: Some(ProcessingStage::Completion),
            message: "Evaluation completed".to_string(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn failed(submission_id: &str, error: &str) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            status: SubmissionStatus::Failed,
            stage: None,
            message: "Evaluation failed".to_string(),
            timestamp: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

/// Broadcasts processing events to all subscribers.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    sender: Arc<broadcast::Sender<ProcessingEvent>>,
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers. No active receivers is fine.
    pub fn send(&self, event: ProcessingEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProcessingEvent> {
        self.sender.subscribe()
    }

    /// Creates a tracker bound to one submission.
    pub fn track(&self, submission_id: &str) -> ProgressTracker {
        ProgressTracker {
            submission_id: submission_id.to_string(),
            sender: Arc::clone(&self.sender),
        }
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Publishes events for a single submission.
pub struct ProgressTracker {
    submission_id: String,
    sender: Arc<broadcast::Sender<ProcessingEvent>>,
}

impl ProgressTracker {
    pub fn stage(&self, stage: ProcessingStage, message: &str) {
        let _ = self
            .sender
            .send(ProcessingEvent::stage(&self.submission_id, stage, message));
    }

    pub fn completed(&self) {
        let _ = self.sender.send(ProcessingEvent::completed(&self.submission_id));
    }

    pub fn failed(&self, error: &str) {
        let _ = self
            .sender
            .send(ProcessingEvent::failed(&self.submission_id, error));
    }
}
