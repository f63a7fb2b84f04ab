use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DealflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

/// Errors from the asset store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write asset '{path}': {source}")]
    WriteAsset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read asset '{path}': {source}")]
    ReadAsset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("File type '{extension}' not allowed for category {category}")]
    DisallowedType {
        category: String,
        extension: String,
    },

    #[error("File too large for category {category}: {size} bytes (max {max} bytes)")]
    TooLarge {
        category: String,
        size: u64,
        max: u64,
    },
}

/// Errors from the job queue lifecycle.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue is shut down; no new jobs accepted")]
    Closed,
}

/// Errors from the owner-facing submission service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Submission not found: {0}")]
    NotFound(String),

    #[error("Submission {id} cannot be modified in status '{status}'")]
    InvalidState { id: String, status: String },

    #[error("Submission has no uploaded assets; at least one is required before processing")]
    NoAssets,

    #[error("Asset index {index} out of range (submission has {len} assets)")]
    AssetIndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub type Result<T> = std::result::Result<T, DealflowError>;
