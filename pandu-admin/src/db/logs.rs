//! Activity log
//!
//! Mutating handlers append one row per action; the dashboard surfaces the
//! most recent entries. Failures to log never fail the originating request.

use pandu_common::db::models::ActivityLogEntry;
use pandu_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use super::now_timestamp;

/// Append an activity-log entry
pub async fn append(
    pool: &SqlitePool,
    user_guid: &str,
    action: &str,
    module: &str,
    description: String,
) {
    let result = sqlx::query(
        "INSERT INTO activity_log (user_guid, action, description, module, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_guid)
    .bind(action)
    .bind(&description)
    .bind(module)
    .bind(now_timestamp())
    .execute(pool)
    .await;

    if let Err(err) = result {
        warn!("Failed to append activity log entry: {}", err);
    }
}

/// The most recent activity-log entries, newest first
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityLogEntry>> {
    let rows = sqlx::query(
        "SELECT id, user_guid, action, description, module, created_at
         FROM activity_log ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ActivityLogEntry {
            id: row.get("id"),
            user_guid: row.get("user_guid"),
            action: row.get("action"),
            description: row.get("description"),
            module: row.get("module"),
            created_at: row.get("created_at"),
        })
        .collect())
}
