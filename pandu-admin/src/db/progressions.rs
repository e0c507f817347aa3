//! Rank-progression queries
//!
//! Reads and scoped aggregations only; tier transitions are written by the
//! progression engine inside its own transactions.

use pandu_common::db::models::{RankProgression, TierLevel};
use pandu_common::{AccessScope, Error, Result};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{like_pattern, opt_date};

/// Progression row joined with member and institution details for lists
#[derive(Debug, Clone, Serialize)]
pub struct ProgressionListRow {
    #[serde(flatten)]
    pub progression: RankProgression,
    pub member_name: String,
    pub member_number: Option<String>,
    pub member_phone: String,
    pub institution_name: Option<String>,
}

/// Scoped tier totals and completion breakdown
#[derive(Debug, Clone, Serialize)]
pub struct ProgressionSummary {
    pub total_tier1: i64,
    pub total_tier2: i64,
    pub total_tier3: i64,
    pub total_participants: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub not_started: i64,
}

pub(crate) fn progression_from_row(row: &SqliteRow) -> RankProgression {
    RankProgression {
        guid: row.get("guid"),
        member_guid: row.get("member_guid"),
        tier1: row.get::<i64, _>("tier1") != 0,
        tier2: row.get::<i64, _>("tier2") != 0,
        tier3: row.get::<i64, _>("tier3") != 0,
        tier1_doc: row.get("tier1_doc"),
        tier2_doc: row.get("tier2_doc"),
        tier3_doc: row.get("tier3_doc"),
        tier1_date: opt_date(row, "tier1_date"),
        tier2_date: opt_date(row, "tier2_date"),
        tier3_date: opt_date(row, "tier3_date"),
    }
}

fn tier_column(tier: TierLevel) -> Option<&'static str> {
    match tier {
        TierLevel::None => None,
        TierLevel::Tier1 => Some("tier1"),
        TierLevel::Tier2 => Some("tier2"),
        TierLevel::Tier3 => Some("tier3"),
    }
}

/// Find a progression row by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<RankProgression>> {
    let row = sqlx::query("SELECT * FROM rank_progressions WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(progression_from_row))
}

/// Like [`find_active`], but a missing row is an error
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<RankProgression> {
    find_active(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound("progression record not found".to_string()))
}

/// Find the progression row for a member, excluding soft-deleted rows
pub async fn find_by_member(pool: &SqlitePool, member_guid: &str) -> Result<Option<RankProgression>> {
    let row =
        sqlx::query("SELECT * FROM rank_progressions WHERE member_guid = ? AND is_delete = 0")
            .bind(member_guid)
            .fetch_optional(pool)
            .await?;
    Ok(row.as_ref().map(progression_from_row))
}

/// Progression row joined with member and institution, by guid
pub async fn get_detail(pool: &SqlitePool, guid: &str) -> Result<ProgressionListRow> {
    let row = sqlx::query(
        r#"
        SELECT p.*, m.name AS member_name, m.member_number, m.phone AS member_phone,
               i.name AS institution_name
        FROM rank_progressions p
        JOIN members m ON m.guid = p.member_guid AND m.is_delete = 0
        LEFT JOIN institutions i ON i.guid = m.institution_guid
        WHERE p.guid = ? AND p.is_delete = 0
        "#,
    )
    .bind(guid)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound("progression record not found".to_string()))?;

    Ok(ProgressionListRow {
        progression: progression_from_row(&row),
        member_name: row.get("member_name"),
        member_number: row.get("member_number"),
        member_phone: row.get("member_phone"),
        institution_name: row.get("institution_name"),
    })
}

/// Scoped, searched, paged listing of progressions that completed a tier
pub async fn list_with_tier(
    pool: &SqlitePool,
    scope: &AccessScope,
    tier: TierLevel,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ProgressionListRow>, i64)> {
    let column = tier_column(tier)
        .ok_or_else(|| Error::Validation("a completed tier must be selected".to_string()))?;

    let mut filter = format!(
        " FROM rank_progressions p
         JOIN members m ON m.guid = p.member_guid AND m.is_delete = 0
         LEFT JOIN institutions i ON i.guid = m.institution_guid
         WHERE p.is_delete = 0 AND p.{} = 1",
        column
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
        "SELECT p.*, m.name AS member_name, m.member_number, m.phone AS member_phone,
                i.name AS institution_name{}
         ORDER BY p.created_at DESC LIMIT ? OFFSET ?",
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
        .map(|row| ProgressionListRow {
            progression: progression_from_row(row),
            member_name: row.get("member_name"),
            member_number: row.get("member_number"),
            member_phone: row.get("member_phone"),
            institution_name: row.get("institution_name"),
        })
        .collect();

    Ok((data, total))
}

async fn scoped_count(pool: &SqlitePool, scope: &AccessScope, predicate: &str) -> Result<i64> {
    let mut sql = format!(
        "SELECT COUNT(*) FROM rank_progressions p
         JOIN members m ON m.guid = p.member_guid AND m.is_delete = 0
         WHERE p.is_delete = 0 AND {}",
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

/// Scoped tier totals for the summary endpoint
pub async fn summary(pool: &SqlitePool, scope: &AccessScope) -> Result<ProgressionSummary> {
    Ok(ProgressionSummary {
        total_tier1: scoped_count(pool, scope, "p.tier1 = 1").await?,
        total_tier2: scoped_count(pool, scope, "p.tier2 = 1").await?,
        total_tier3: scoped_count(pool, scope, "p.tier3 = 1").await?,
        total_participants: scoped_count(pool, scope, "1 = 1").await?,
        completed: scoped_count(pool, scope, "p.tier3 = 1").await?,
        in_progress: scoped_count(pool, scope, "p.tier2 = 1 AND p.tier3 = 0").await?,
        not_started: scoped_count(pool, scope, "p.tier1 = 0").await?,
    })
}

/// Count progression rows under the caller's scope (dashboard)
pub async fn count(pool: &SqlitePool, scope: &AccessScope) -> Result<i64> {
    scoped_count(pool, scope, "1 = 1").await
}
