//! Import run history
//!
//! One row per batch in `import_runs`. Failures are stored as a JSON array.

use chrono::{DateTime, Utc};
use roster_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::models::{BatchReport, RecordFailure};

const RUN_COLUMNS: &str = r#"
    run_id, source, started_at, ended_at,
    submitted, succeeded, failed, not_attempted,
    created, updated, images_attached, cancelled, failures
"#;

/// Save a batch report (insert or replace by run id)
pub async fn save_run(pool: &SqlitePool, report: &BatchReport) -> Result<()> {
    let failures = serde_json::to_string(&report.failures)
        .map_err(|e| Error::Internal(format!("Failed to serialize failures: {}", e)))?;
    let started_at = roster_common::time::to_storage_string(&report.started_at);
    let ended_at = report
        .ended_at
        .map(|dt| roster_common::time::to_storage_string(&dt));

    sqlx::query(
        r#"
        INSERT INTO import_runs (
            run_id, source, started_at, ended_at,
            submitted, succeeded, failed, not_attempted,
            created, updated, images_attached, cancelled, failures
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(run_id) DO UPDATE SET
            ended_at = excluded.ended_at,
            submitted = excluded.submitted,
            succeeded = excluded.succeeded,
            failed = excluded.failed,
            not_attempted = excluded.not_attempted,
            created = excluded.created,
            updated = excluded.updated,
            images_attached = excluded.images_attached,
            cancelled = excluded.cancelled,
            failures = excluded.failures
        "#,
    )
    .bind(report.run_id.to_string())
    .bind(&report.source)
    .bind(&started_at)
    .bind(&ended_at)
    .bind(report.submitted as i64)
    .bind(report.succeeded as i64)
    .bind(report.failed as i64)
    .bind(report.not_attempted as i64)
    .bind(report.created as i64)
    .bind(report.updated as i64)
    .bind(report.images_attached as i64)
    .bind(report.cancelled)
    .bind(&failures)
    .execute(pool)
    .await?;

    tracing::debug!(run_id = %report.run_id, "Import run saved");
    Ok(())
}

/// Load one run by id
pub async fn load_run(pool: &SqlitePool, run_id: Uuid) -> Result<Option<BatchReport>> {
    let row = sqlx::query(&format!("SELECT {} FROM import_runs WHERE run_id = ?", RUN_COLUMNS))
        .bind(run_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(report_from_row).transpose()
}

/// Most recent runs first
pub async fn list_runs(pool: &SqlitePool, limit: u32) -> Result<Vec<BatchReport>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM import_runs ORDER BY started_at DESC LIMIT ?",
        RUN_COLUMNS
    ))
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter().map(report_from_row).collect()
}

fn report_from_row(row: &SqliteRow) -> Result<BatchReport> {
    let run_id: String = row.get("run_id");
    let run_id = Uuid::parse_str(&run_id)
        .map_err(|e| Error::Internal(format!("Invalid run_id {}: {}", run_id, e)))?;

    let failures: String = row.get("failures");
    let failures: Vec<RecordFailure> = serde_json::from_str(&failures)
        .map_err(|e| Error::Internal(format!("Failed to deserialize failures: {}", e)))?;

    let started_at: String = row.get("started_at");
    let ended_at: Option<String> = row.get("ended_at");

    Ok(BatchReport {
        run_id,
        source: row.get("source"),
        started_at: parse_timestamp(&started_at)?,
        ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
        submitted: count(row, "submitted"),
        succeeded: count(row, "succeeded"),
        failed: count(row, "failed"),
        not_attempted: count(row, "not_attempted"),
        created: count(row, "created"),
        updated: count(row, "updated"),
        images_attached: count(row, "images_attached"),
        cancelled: row.get("cancelled"),
        failures,
    })
}

fn count(row: &SqliteRow, column: &str) -> usize {
    row.get::<i64, _>(column).max(0) as usize
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    roster_common::time::from_storage_string(value)
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp {}: {}", value, e)))
}
