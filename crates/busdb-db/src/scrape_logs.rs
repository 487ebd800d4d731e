//! Database operations for `scrape_logs`.
//!
//! A log is created `STARTED` and finalized exactly once, to `SUCCESS` or
//! `FAILED`. Finalizing anything other than a `STARTED` row is rejected.

use busdb_core::ScrapeStatus;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scrape_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeLogRow {
    pub id: i64,
    pub public_id: Uuid,
    pub route_url: String,
    pub status: String,
    /// The schema defines this as `INTEGER NOT NULL DEFAULT 0`.
    pub buses_scraped: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

const SCRAPE_LOG_COLUMNS: &str =
    "id, public_id, route_url, status, buses_scraped, error_message, started_at, completed_at";

/// Creates a `STARTED` log for `route_url` and returns the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_log(pool: &PgPool, route_url: &str) -> Result<ScrapeLogRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeLogRow>(&format!(
        "INSERT INTO scrape_logs (public_id, route_url, status) \
         VALUES ($1, $2, $3) \
         RETURNING {SCRAPE_LOG_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(route_url)
    .bind(ScrapeStatus::Started.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a `STARTED` log as `SUCCESS` with the number of buses stored.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeLogTransition`] if the log is missing or
/// already finalized, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scrape_log(
    pool: &PgPool,
    id: i64,
    buses_scraped: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_logs \
         SET status = $1, buses_scraped = $2, completed_at = NOW() \
         WHERE id = $3 AND status = $4",
    )
    .bind(ScrapeStatus::Success.as_str())
    .bind(buses_scraped)
    .bind(id)
    .bind(ScrapeStatus::Started.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeLogTransition {
            id,
            expected_status: ScrapeStatus::Started.as_str(),
        });
    }

    Ok(())
}

/// Marks a `STARTED` log as `FAILED` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeLogTransition`] if the log is missing or
/// already finalized, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scrape_log(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_logs \
         SET status = $1, error_message = $2, completed_at = NOW() \
         WHERE id = $3 AND status = $4",
    )
    .bind(ScrapeStatus::Failed.as_str())
    .bind(error_message)
    .bind(id)
    .bind(ScrapeStatus::Started.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeLogTransition {
            id,
            expected_status: ScrapeStatus::Started.as_str(),
        });
    }

    Ok(())
}

/// Fetches a single log by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_log(pool: &PgPool, id: i64) -> Result<ScrapeLogRow, DbError> {
    sqlx::query_as::<_, ScrapeLogRow>(&format!(
        "SELECT {SCRAPE_LOG_COLUMNS} FROM scrape_logs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` logs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_logs(pool: &PgPool, limit: i64) -> Result<Vec<ScrapeLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeLogRow>(&format!(
        "SELECT {SCRAPE_LOG_COLUMNS} FROM scrape_logs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
