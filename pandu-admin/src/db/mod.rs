//! Database access layer for pandu-admin
//!
//! Row-level queries only; business preconditions live in the engine
//! modules. Every list/aggregate query takes the caller's [`AccessScope`]
//! and applies it before any search or pagination predicate.
//!
//! [`AccessScope`]: pandu_common::AccessScope

pub mod badge_types;
pub mod badges;
pub mod garuda;
pub mod institutions;
pub mod logs;
pub mod members;
pub mod progressions;
pub mod users;

use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row};

/// Read an optional DATE column stored as `YYYY-MM-DD` text
pub(crate) fn opt_date(row: &SqliteRow, column: &str) -> Option<NaiveDate> {
    let value: Option<String> = row.get(column);
    value.and_then(|s| s.parse().ok())
}

/// Current timestamp in the stored TEXT form
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// LIKE pattern matching anywhere in the column
pub(crate) fn like_pattern(search: &str) -> String {
    format!("%{}%", search)
}
