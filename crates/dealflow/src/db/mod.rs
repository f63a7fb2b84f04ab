//! SQLite persistence for submissions.
//!
//! A single bundled-rusqlite connection guarded by a mutex backs the whole
//! crate. SQLite serializes writes anyway, so the coarse lock costs little,
//! and WAL mode keeps concurrent readers cheap.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod migrations;
pub mod submission_repo;

pub use error::DatabaseError;

/// Shared handle to the submissions database. Clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates the database file and brings the schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        log::info!("Opened submissions database at {}", path.display());
        Self::bootstrap(conn)
    }

    /// In-memory database with the full schema, for tests and ephemeral runs.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::apply_pending(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection lock held.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Canonical on-disk location: `<home>/.dealflow/data/dealflow.db`.
pub fn default_database_path(home: &Path) -> PathBuf {
    home.join(".dealflow").join("data").join("dealflow.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(db: &Database, name: &str) -> bool {
        db.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )?;
            Ok(count == 1)
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_has_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(table_exists(&db, "submissions"));
        assert!(table_exists(&db, "schema_migrations"));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("data.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert!(table_exists(&db, "submissions"));
    }

    #[test]
    fn test_clones_share_one_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO submissions (id, owner_id, payload, assets, status, created_at, updated_at)
                 VALUES ('s1', 'f1', '{}', '[]', 'submitted', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let count = other
            .with_conn(|conn| {
                let n: u32 = conn.query_row("SELECT COUNT(*) FROM submissions", [], |r| r.get(0))?;
                Ok(n)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path(Path::new("/home/user"));
        assert_eq!(
            path,
            PathBuf::from("/home/user/.dealflow/data/dealflow.db")
        );
    }
}
