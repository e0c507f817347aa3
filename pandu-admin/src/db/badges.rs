//! Badge-award queries
//!
//! Reads and scoped aggregations; awarding and revocation are written by
//! the award engine.

use pandu_common::db::models::BadgeAward;
use pandu_common::{AccessScope, Error, Result};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{like_pattern, opt_date};

/// Badge award joined with member, institution, and badge-type details
#[derive(Debug, Clone, Serialize)]
pub struct BadgeListRow {
    #[serde(flatten)]
    pub award: BadgeAward,
    pub member_name: String,
    pub member_number: Option<String>,
    pub member_phone: String,
    pub institution_name: Option<String>,
    pub badge_type_name: String,
    pub badge_type_category: Option<String>,
}

/// A member's badge count within one badge-type category
#[derive(Debug, Clone)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

pub(crate) fn badge_from_row(row: &SqliteRow) -> BadgeAward {
    BadgeAward {
        guid: row.get("guid"),
        member_guid: row.get("member_guid"),
        badge_type_guid: row.get("badge_type_guid"),
        doc_number: row.get("doc_number"),
        award_date: opt_date(row, "award_date"),
        examiner_name: row.get("examiner_name"),
        examiner_position: row.get("examiner_position"),
        examiner_address: row.get("examiner_address"),
    }
}

/// Find a badge award by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<BadgeAward>> {
    let row = sqlx::query("SELECT * FROM badge_awards WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(badge_from_row))
}

/// Badge award joined with its details, by guid
pub async fn get_detail(pool: &SqlitePool, guid: &str) -> Result<BadgeListRow> {
    let row = sqlx::query(
        r#"
        SELECT b.*, m.name AS member_name, m.member_number, m.phone AS member_phone,
               i.name AS institution_name, t.name AS badge_type_name,
               t.category AS badge_type_category
        FROM badge_awards b
        JOIN members m ON m.guid = b.member_guid AND m.is_delete = 0
        JOIN badge_types t ON t.guid = b.badge_type_guid
        LEFT JOIN institutions i ON i.guid = m.institution_guid
        WHERE b.guid = ? AND b.is_delete = 0
        "#,
    )
    .bind(guid)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound("badge award not found".to_string()))?;

    Ok(badge_list_row(&row))
}

fn badge_list_row(row: &SqliteRow) -> BadgeListRow {
    BadgeListRow {
        award: badge_from_row(row),
        member_name: row.get("member_name"),
        member_number: row.get("member_number"),
        member_phone: row.get("member_phone"),
        institution_name: row.get("institution_name"),
        badge_type_name: row.get("badge_type_name"),
        badge_type_category: row.get("badge_type_category"),
    }
}

/// Scoped, searched, paged badge-award listing
pub async fn list(
    pool: &SqlitePool,
    scope: &AccessScope,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<BadgeListRow>, i64)> {
    let mut filter = String::from(
        " FROM badge_awards b
         JOIN members m ON m.guid = b.member_guid AND m.is_delete = 0
         JOIN badge_types t ON t.guid = b.badge_type_guid
         LEFT JOIN institutions i ON i.guid = m.institution_guid
         WHERE b.is_delete = 0",
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
        "SELECT b.*, m.name AS member_name, m.member_number, m.phone AS member_phone,
                i.name AS institution_name, t.name AS badge_type_name,
                t.category AS badge_type_category{}
         ORDER BY b.created_at DESC LIMIT ? OFFSET ?",
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

    Ok((rows.iter().map(badge_list_row).collect(), total))
}

/// A member's non-deleted badge awards grouped by badge-type category
///
/// Badge types without a category group under the empty string.
pub async fn category_counts(pool: &SqlitePool, member_guid: &str) -> Result<Vec<CategoryCount>> {
    let rows = sqlx::query(
        r#"
        SELECT COALESCE(t.category, '') AS category, COUNT(*) AS n
        FROM badge_awards b
        JOIN badge_types t ON t.guid = b.badge_type_guid
        WHERE b.member_guid = ? AND b.is_delete = 0
        GROUP BY COALESCE(t.category, '')
        "#,
    )
    .bind(member_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| CategoryCount {
            category: row.get("category"),
            count: row.get("n"),
        })
        .collect())
}

/// Total non-deleted badge awards held by a member
pub async fn count_for_member(pool: &SqlitePool, member_guid: &str) -> Result<i64> {
    let total =
        sqlx::query_scalar("SELECT COUNT(*) FROM badge_awards WHERE member_guid = ? AND is_delete = 0")
            .bind(member_guid)
            .fetch_one(pool)
            .await?;
    Ok(total)
}

/// Count badge awards under the caller's scope (dashboard)
pub async fn count(pool: &SqlitePool, scope: &AccessScope) -> Result<i64> {
    let mut sql = String::from(
        "SELECT COUNT(*) FROM badge_awards b
         JOIN members m ON m.guid = b.member_guid AND m.is_delete = 0
         WHERE b.is_delete = 0",
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
