//! Failures raised by the persistence layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the database location.
    #[error("Could not prepare database path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A stored column held JSON that no longer parses.
    #[error("Corrupt JSON in column '{column}' for submission {id}: {reason}")]
    CorruptColumn {
        id: String,
        column: &'static str,
        reason: String,
    },

    /// A thread panicked while holding the connection lock.
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}
