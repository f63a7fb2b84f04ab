//! Submission repository — CRUD operations for the `submissions` table.
//!
//! Rows are decoded into the domain [`Submission`] type. JSON columns
//! (payload, assets, report) that fail to parse surface as
//! [`DatabaseError::CorruptColumn`] rather than panicking.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::report::StructuredReport;
use crate::submission::{FailureKind, ProcessingStage, Submission, SubmissionStatus};

/// A raw submission row, columns as stored.
#[derive(Debug, Clone)]
struct SubmissionRow {
    id: String,
    owner_id: String,
    payload: String,
    assets: String,
    status: String,
    stage: Option<String>,
    failure_cause: Option<String>,
    failure_kind: Option<String>,
    report: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SubmissionRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            payload: row.get("payload")?,
            assets: row.get("assets")?,
            status: row.get("status")?,
            stage: row.get("stage")?,
            failure_cause: row.get("failure_cause")?,
            failure_kind: row.get("failure_kind")?,
            report: row.get("report")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn decode(self) -> Result<Submission, DatabaseError> {
        let corrupt = |column: &'static str, reason: String| DatabaseError::CorruptColumn {
            id: self.id.clone(),
            column,
            reason,
        };

        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| corrupt("payload", e.to_string()))?;
        let assets =
            serde_json::from_str(&self.assets).map_err(|e| corrupt("assets", e.to_string()))?;
        let report: Option<StructuredReport> = match &self.report {
            Some(raw) => {
                Some(serde_json::from_str(raw).map_err(|e| corrupt("report", e.to_string()))?)
            }
            None => None,
        };
        let status = SubmissionStatus::parse(&self.status)
            .ok_or_else(|| corrupt("status", format!("unknown status '{}'", self.status)))?;
        let stage = match &self.stage {
            Some(raw) => Some(
                ProcessingStage::parse(raw)
                    .ok_or_else(|| corrupt("stage", format!("unknown stage '{}'", raw)))?,
            ),
            None => None,
        };
        let failure_kind = match &self.failure_kind {
            Some(raw) => Some(
                FailureKind::parse(raw)
                    .ok_or_else(|| corrupt("failure_kind", format!("unknown kind '{}'", raw)))?,
            ),
            None => None,
        };
        let created_at = parse_timestamp(&self.created_at)
            .map_err(|e| corrupt("created_at", e))?;
        let updated_at = parse_timestamp(&self.updated_at)
            .map_err(|e| corrupt("updated_at", e))?;

        Ok(Submission {
            id: self.id,
            owner_id: self.owner_id,
            payload,
            assets,
            status,
            stage,
            failure_cause: self.failure_cause,
            failure_kind,
            report,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::CorruptColumn {
        id: String::new(),
        column: "json",
        reason: e.to_string(),
    })
}

/// Inserts a new submission row.
pub fn insert(db: &Database, sub: &Submission) -> Result<(), DatabaseError> {
    let payload = encode_json(&sub.payload)?;
    let assets = encode_json(&sub.assets)?;
    let report = match &sub.report {
        Some(r) => Some(encode_json(r)?),
        None => None,
    };
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO submissions (id, owner_id, payload, assets, status, stage,
             failure_cause, failure_kind, report, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                sub.id,
                sub.owner_id,
                payload,
                assets,
                sub.status.as_str(),
                sub.stage.map(|s| s.as_str()),
                sub.failure_cause,
                sub.failure_kind.map(|k| k.as_str()),
                report,
                sub.created_at.to_rfc3339(),
                sub.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    })
}

/// Owner-editable fields for a partial update. `None` leaves the column
/// untouched.
#[derive(Debug, Default)]
pub struct SubmissionPatch {
    pub payload: Option<serde_json::Value>,
    pub assets: Option<Vec<crate::submission::AssetRef>>,
}

/// Applies a partial update as one statement, touching only the named
/// fields. A missing row is a silent no-op.
pub fn update_fields(
    db: &Database,
    id: &str,
    patch: &SubmissionPatch,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let mut sets = vec!["updated_at = ?2".to_string()];
    let mut values: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(id.to_string()), Box::new(updated_at.to_rfc3339())];

    if let Some(payload) = &patch.payload {
        values.push(Box::new(encode_json(payload)?));
        sets.push(format!("payload = ?{}", values.len()));
    }
    if let Some(assets) = &patch.assets {
        values.push(Box::new(encode_json(assets)?));
        sets.push(format!("assets = ?{}", values.len()));
    }

    let sql = format!("UPDATE submissions SET {} WHERE id = ?1", sets.join(", "));
    db.with_conn(|conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(())
    })
}

/// Finds a submission by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Submission>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM submissions WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], SubmissionRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })?;
    row.map(SubmissionRow::decode).transpose()
}

/// Lists all submissions belonging to an owner, in creation order.
pub fn list_by_owner(db: &Database, owner_id: &str) -> Result<Vec<Submission>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM submissions WHERE owner_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows: Vec<SubmissionRow> = stmt
            .query_map(params![owner_id], SubmissionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(SubmissionRow::decode).collect()
}

/// Deletes a submission row. Deleting a missing row is a no-op.
pub fn delete(db: &Database, id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM submissions WHERE id = ?1", params![id])?;
        Ok(())
    })
}

/// Updates only the status, stage and updated_at of a submission.
/// A missing row is a silent no-op.
pub fn update_status(
    db: &Database,
    id: &str,
    status: SubmissionStatus,
    stage: Option<ProcessingStage>,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE submissions SET status = ?2, stage = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                id,
                status.as_str(),
                stage.map(|s| s.as_str()),
                updated_at.to_rfc3339()
            ],
        )?;
        Ok(())
    })
}

/// Writes the finished report and flips status to `completed` in a single
/// statement, so no observer can see one without the other.
pub fn complete_with_report(
    db: &Database,
    id: &str,
    report: &StructuredReport,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let encoded = encode_json(report)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE submissions
             SET report = ?2, status = ?3, stage = ?4, failure_cause = NULL,
                 failure_kind = NULL, updated_at = ?5
             WHERE id = ?1",
            params![
                id,
                encoded,
                SubmissionStatus::Completed.as_str(),
                ProcessingStage::Completion.as_str(),
                updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    })
}

/// Marks a submission failed with a cause and kind, in a single statement.
pub fn mark_failed(
    db: &Database,
    id: &str,
    cause: &str,
    kind: FailureKind,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE submissions
             SET status = ?2, failure_cause = ?3, failure_kind = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                id,
                SubmissionStatus::Failed.as_str(),
                cause,
                kind.as_str(),
                updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    })
}

/// Counts submissions with the given status.
pub fn count_by_status(db: &Database, status: SubmissionStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM submissions WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
