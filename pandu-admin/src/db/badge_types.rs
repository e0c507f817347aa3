//! Badge-type catalog queries

use pandu_common::db::models::BadgeType;
use pandu_common::{Error, Result};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{like_pattern, now_timestamp};

/// Caller-supplied badge-type fields, shared by create and update
#[derive(Debug, Clone, Deserialize)]
pub struct BadgeTypeInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

pub(crate) fn badge_type_from_row(row: &SqliteRow) -> BadgeType {
    BadgeType {
        guid: row.get("guid"),
        name: row.get("name"),
        category: row.get("category"),
        color: row.get("color"),
    }
}

/// Find a badge type by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<BadgeType>> {
    let row = sqlx::query("SELECT * FROM badge_types WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(badge_type_from_row))
}

/// Like [`find_active`], but a missing badge type is an error
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<BadgeType> {
    find_active(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound("badge type not found".to_string()))
}

/// Searched, paged badge-type listing
pub async fn list(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<BadgeType>, i64)> {
    let mut filter = String::from(" FROM badge_types WHERE is_delete = 0");
    if search.is_some() {
        filter.push_str(" AND (name LIKE ? OR category LIKE ?)");
    }

    let count_sql = format!("SELECT COUNT(*){}", filter);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(text) = search {
        let pattern = like_pattern(text);
        count_query = count_query.bind(pattern.clone()).bind(pattern);
    }
    let total = count_query.fetch_one(pool).await?;

    let data_sql = format!("SELECT *{} ORDER BY name LIMIT ? OFFSET ?", filter);
    let mut data_query = sqlx::query(&data_sql);
    if let Some(text) = search {
        let pattern = like_pattern(text);
        data_query = data_query.bind(pattern.clone()).bind(pattern);
    }
    let rows = data_query.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok((rows.iter().map(badge_type_from_row).collect(), total))
}

/// Insert a new badge type
pub async fn insert(pool: &SqlitePool, input: &BadgeTypeInput) -> Result<BadgeType> {
    let guid = Uuid::new_v4().to_string();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO badge_types (guid, name, category, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.name)
    .bind(&input.category)
    .bind(&input.color)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_active(pool, &guid).await
}

/// Update an existing badge type
pub async fn update(pool: &SqlitePool, guid: &str, input: &BadgeTypeInput) -> Result<BadgeType> {
    get_active(pool, guid).await?;

    sqlx::query(
        "UPDATE badge_types SET name = ?, category = ?, color = ?, updated_at = ?
         WHERE guid = ? AND is_delete = 0",
    )
    .bind(&input.name)
    .bind(&input.category)
    .bind(&input.color)
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await?;

    get_active(pool, guid).await
}

/// Soft-delete a badge type
pub async fn soft_delete(pool: &SqlitePool, guid: &str) -> Result<()> {
    let result = sqlx::query(
        "UPDATE badge_types SET is_delete = 1, updated_at = ? WHERE guid = ? AND is_delete = 0",
    )
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("badge type not found".to_string()));
    }
    Ok(())
}
