//! Real-time processing event streaming.

pub mod progress;

pub use progress::{ProcessingEvent, ProgressBroadcaster, ProgressTracker};
