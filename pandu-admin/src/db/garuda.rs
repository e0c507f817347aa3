//! Top-honor (Garuda) award queries
//!
//! Reads and scoped aggregations; the award lifecycle is written by the
//! award engine.

use pandu_common::db::models::{GarudaAward, GarudaStatus};
use pandu_common::{AccessScope, Error, Result};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::like_pattern;

/// Garuda row joined with member details
#[derive(Debug, Clone, Serialize)]
pub struct GarudaListRow {
    #[serde(flatten)]
    pub award: GarudaAward,
    pub member_name: String,
    pub member_number: Option<String>,
}

/// Scoped status totals and per-tier-label breakdown
#[derive(Debug, Clone, Serialize)]
pub struct GarudaSummary {
    pub total: i64,
    pub total_approved: i64,
    pub total_pending: i64,
    pub by_tier_label: Vec<TierLabelCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierLabelCount {
    pub tier_label: String,
    pub count: i64,
}

pub(crate) fn garuda_from_row(row: &SqliteRow) -> GarudaAward {
    GarudaAward {
        guid: row.get("guid"),
        member_guid: row.get("member_guid"),
        tier_label: row.get("tier_label"),
        badge_count: row.get("badge_count"),
        status: GarudaStatus::from_i64(row.get("status")),
        approved_by: row.get("approved_by"),
    }
}

/// Find a garuda award by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<GarudaAward>> {
    let row = sqlx::query("SELECT * FROM garuda_awards WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(garuda_from_row))
}

/// Like [`find_active`], but a missing award is an error
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<GarudaAward> {
    find_active(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound("garuda award not found".to_string()))
}

/// Whether any garuda row exists for a member, soft-deleted rows included.
/// A member registers for the top honor at most once.
pub async fn exists_for_member(pool: &SqlitePool, member_guid: &str) -> Result<bool> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT guid FROM garuda_awards WHERE member_guid = ?")
            .bind(member_guid)
            .fetch_optional(pool)
            .await?;
    Ok(existing.is_some())
}

/// Garuda row joined with member details, by guid
pub async fn get_detail(pool: &SqlitePool, guid: &str) -> Result<GarudaListRow> {
    let row = sqlx::query(
        r#"
        SELECT g.*, m.name AS member_name, m.member_number
        FROM garuda_awards g
        JOIN members m ON m.guid = g.member_guid AND m.is_delete = 0
        WHERE g.guid = ? AND g.is_delete = 0
        "#,
    )
    .bind(guid)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound("garuda award not found".to_string()))?;

    Ok(GarudaListRow {
        award: garuda_from_row(&row),
        member_name: row.get("member_name"),
        member_number: row.get("member_number"),
    })
}

/// Scoped, searched, paged garuda listing, newest first
pub async fn list(
    pool: &SqlitePool,
    scope: &AccessScope,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<GarudaListRow>, i64)> {
    let mut filter = String::from(
        " FROM garuda_awards g
         JOIN members m ON m.guid = g.member_guid AND m.is_delete = 0
         WHERE g.is_delete = 0",
    );
    if scope.institution().is_some() {
        filter.push_str(" AND m.institution_guid = ?");
    }
    if search.is_some() {
        filter.push_str(" AND (m.name LIKE ? OR m.phone LIKE ?)");
    }

    let count_sql = format!("SELECT COUNT(*){}", filter);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(inst) = scope.institution() {
        count_query = count_query.bind(inst.to_string());
    }
    if let Some(text) = search {
        let pattern = like_pattern(text);
        count_query = count_query.bind(pattern.clone()).bind(pattern);
    }
    let total = count_query.fetch_one(pool).await?;

    let data_sql = format!(
        "SELECT g.*, m.name AS member_name, m.member_number{}
         ORDER BY g.created_at DESC LIMIT ? OFFSET ?",
        filter
    );
    let mut data_query = sqlx::query(&data_sql);
    if let Some(inst) = scope.institution() {
        data_query = data_query.bind(inst.to_string());
    }
    if let Some(text) = search {
        let pattern = like_pattern(text);
        data_query = data_query.bind(pattern.clone()).bind(pattern);
    }
    let rows = data_query.bind(limit).bind(offset).fetch_all(pool).await?;

    let data = rows
        .iter()
        .map(|row| GarudaListRow {
            award: garuda_from_row(row),
            member_name: row.get("member_name"),
            member_number: row.get("member_number"),
        })
        .collect();

    Ok((data, total))
}

async fn scoped_count(pool: &SqlitePool, scope: &AccessScope, predicate: &str) -> Result<i64> {
    let mut sql = format!(
        "SELECT COUNT(*) FROM garuda_awards g
         JOIN members m ON m.guid = g.member_guid AND m.is_delete = 0
         WHERE g.is_delete = 0 AND {}",
        predicate
    );
    if scope.institution().is_some() {
        sql.push_str(" AND m.institution_guid = ?");
    }

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(inst) = scope.institution() {
        query = query.bind(inst.to_string());
    }
    Ok(query.fetch_one(pool).await?)
}

/// Scoped status totals for the summary endpoint
pub async fn summary(pool: &SqlitePool, scope: &AccessScope) -> Result<GarudaSummary> {
    let total = scoped_count(pool, scope, "1 = 1").await?;
    let total_approved = scoped_count(pool, scope, "g.status = 1").await?;
    let total_pending = scoped_count(pool, scope, "g.status = 0").await?;

    let mut sql = String::from(
        "SELECT g.tier_label, COUNT(*) AS n
         FROM garuda_awards g
         JOIN members m ON m.guid = g.member_guid AND m.is_delete = 0
         WHERE g.is_delete = 0",
    );
    if scope.institution().is_some() {
        sql.push_str(" AND m.institution_guid = ?");
    }
    sql.push_str(" GROUP BY g.tier_label");

    let mut query = sqlx::query(&sql);
    if let Some(inst) = scope.institution() {
        query = query.bind(inst.to_string());
    }
    let rows = query.fetch_all(pool).await?;

    let by_tier_label = rows
        .iter()
        .map(|row| TierLabelCount {
            tier_label: row.get("tier_label"),
            count: row.get("n"),
        })
        .collect();

    Ok(GarudaSummary {
        total,
        total_approved,
        total_pending,
        by_tier_label,
    })
}
