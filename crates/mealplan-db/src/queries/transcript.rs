//! Database query functions for the `transcript_entries` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::TranscriptRow;

/// Append one request/response pair. Returns the inserted row with
/// server-generated defaults (id, created_at).
pub async fn insert_entry(
    pool: &PgPool,
    request_text: &str,
    response_text: &str,
) -> Result<TranscriptRow> {
    let row = sqlx::query_as::<_, TranscriptRow>(
        "INSERT INTO transcript_entries (request_text, response_text) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(request_text)
    .bind(response_text)
    .fetch_one(pool)
    .await
    .context("failed to insert transcript entry")?;

    Ok(row)
}

/// The most recent `limit` entries, returned oldest first.
pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<TranscriptRow>> {
    let rows = sqlx::query_as::<_, TranscriptRow>(
        "SELECT * FROM ( \
             SELECT * FROM transcript_entries ORDER BY created_at DESC, id DESC LIMIT $1 \
         ) recent \
         ORDER BY created_at, id",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list transcript entries")?;

    Ok(rows)
}

/// Total number of transcript entries.
pub async fn count_entries(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transcript_entries")
        .fetch_one(pool)
        .await
        .context("failed to count transcript entries")?;

    Ok(count)
}
