//! Processing pipeline: ingestion, AI analysis, report generation and
//! atomic completion for one submission at a time.

pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::{Pipeline, PipelineDeps};
