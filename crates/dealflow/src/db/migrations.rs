//! Schema migrations, applied in version order when the database opens.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_submissions",
        sql: include_str!("sql/001_create_submissions.sql"),
    },
    Migration {
        version: 2,
        name: "index_submissions_owner",
        sql: include_str!("sql/002_index_owner.sql"),
    },
];

/// Brings the schema up to the latest version. Applied versions are
/// recorded in `schema_migrations`, so reruns are no-ops.
pub fn apply_pending(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        log::info!(
            "Applying schema migration {} ({})",
            migration.version,
            migration.name
        );
        conn.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;
        conn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.name],
        )?;
    }

    Ok(())
}
