pub mod adapter;
pub mod assets;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod report;
pub mod service;
pub mod submission;
pub mod worker;

pub use adapter::{AdapterError, AnalysisProvider, AnalysisRequest, GeminiAdapter, StubAdapter};
pub use assets::AssetStore;
pub use broadcast::{ProcessingEvent, ProgressBroadcaster};
pub use config::{load_config, load_config_from_str, AdapterConfig, Config, RetryConfig};
pub use db::Database;
pub use error::{DealflowError, QueueError, Result, ServiceError, StorageError};
pub use pipeline::{Pipeline, PipelineContext, PipelineDeps};
pub use queue::{Dequeued, Job, JobQueue};
pub use report::{Insights, Scores, StructuredReport, REPORT_SCHEMA_VERSION};
pub use service::{QueueStats, SubmissionService};
pub use submission::{AssetCategory, AssetRef, FailureKind, ProcessingStage, Submission, SubmissionStatus};
pub use worker::WorkerPool;
