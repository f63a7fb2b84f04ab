use crate::broadcast::ProgressTracker;
use crate::submission::ProcessingStage;

/// Events emitted by the pipeline during processing.
pub enum ProgressEvent {
    Stage {
        stage: ProcessingStage,
        message: String,
    },
    Completed,
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events onto the broadcast channel.
pub struct BroadcastProgress {
    tracker: ProgressTracker,
}

impl BroadcastProgress {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Stage { stage, message } => self.tracker.stage(stage, &message),
            ProgressEvent::Completed => self.tracker.completed(),
            ProgressEvent::Failed { error } => self.tracker.failed(&error),
        }
    }
}
