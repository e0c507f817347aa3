//! Institution queries

use pandu_common::db::models::Institution;
use pandu_common::{AccessScope, Error, Result};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{like_pattern, now_timestamp};

/// Caller-supplied institution fields, shared by create and update
#[derive(Debug, Clone, Deserialize)]
pub struct InstitutionInput {
    pub name: String,
    #[serde(default)]
    pub sub_district: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub troop_male: Option<String>,
    #[serde(default)]
    pub troop_female: Option<String>,
    #[serde(default)]
    pub troop_leader_male: Option<String>,
    #[serde(default)]
    pub troop_leader_female: Option<String>,
    #[serde(default)]
    pub troop_leader_number_male: Option<String>,
    #[serde(default)]
    pub troop_leader_number_female: Option<String>,
    #[serde(default)]
    pub headmaster_name: Option<String>,
    #[serde(default)]
    pub headmaster_number: Option<String>,
}

pub(crate) fn institution_from_row(row: &SqliteRow) -> Institution {
    Institution {
        guid: row.get("guid"),
        name: row.get("name"),
        sub_district: row.get("sub_district"),
        address: row.get("address"),
        troop_male: row.get("troop_male"),
        troop_female: row.get("troop_female"),
        troop_leader_male: row.get("troop_leader_male"),
        troop_leader_female: row.get("troop_leader_female"),
        troop_leader_number_male: row.get("troop_leader_number_male"),
        troop_leader_number_female: row.get("troop_leader_number_female"),
        headmaster_name: row.get("headmaster_name"),
        headmaster_number: row.get("headmaster_number"),
    }
}

/// Find an institution by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<Institution>> {
    let row = sqlx::query("SELECT * FROM institutions WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(institution_from_row))
}

/// Like [`find_active`], but a missing institution is an error
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<Institution> {
    find_active(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound("institution not found".to_string()))
}

/// The institution a member belongs to; missing affiliation is an error
/// because document numbers need the troop unit token.
pub async fn get_for_member(
    pool: &SqlitePool,
    institution_guid: Option<&str>,
) -> Result<Institution> {
    match institution_guid {
        Some(guid) => get_active(pool, guid).await,
        None => Err(Error::NotFound("institution not found".to_string())),
    }
}

/// Searched, paged institution listing
pub async fn list(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Institution>, i64)> {
    let mut filter = String::from(" FROM institutions WHERE is_delete = 0");
    if search.is_some() {
        filter.push_str(" AND name LIKE ?");
    }

    let count_sql = format!("SELECT COUNT(*){}", filter);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(text) = search {
        count_query = count_query.bind(like_pattern(text));
    }
    let total = count_query.fetch_one(pool).await?;

    let data_sql = format!("SELECT *{} ORDER BY name LIMIT ? OFFSET ?", filter);
    let mut data_query = sqlx::query(&data_sql);
    if let Some(text) = search {
        data_query = data_query.bind(like_pattern(text));
    }
    let rows = data_query.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok((rows.iter().map(institution_from_row).collect(), total))
}

/// Insert a new institution; names are unique among non-deleted rows
pub async fn insert(pool: &SqlitePool, input: &InstitutionInput) -> Result<Institution> {
    let guid = Uuid::new_v4().to_string();
    let now = now_timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO institutions (
            guid, name, sub_district, address, troop_male, troop_female,
            troop_leader_male, troop_leader_female, troop_leader_number_male,
            troop_leader_number_female, headmaster_name, headmaster_number,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.name)
    .bind(&input.sub_district)
    .bind(&input.address)
    .bind(&input.troop_male)
    .bind(&input.troop_female)
    .bind(&input.troop_leader_male)
    .bind(&input.troop_leader_female)
    .bind(&input.troop_leader_number_male)
    .bind(&input.troop_leader_number_female)
    .bind(&input.headmaster_name)
    .bind(&input.headmaster_number)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => get_active(pool, &guid).await,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("institution name already registered".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Update an existing institution
pub async fn update(
    pool: &SqlitePool,
    guid: &str,
    input: &InstitutionInput,
) -> Result<Institution> {
    get_active(pool, guid).await?;

    let result = sqlx::query(
        r#"
        UPDATE institutions SET
            name = ?, sub_district = ?, address = ?, troop_male = ?,
            troop_female = ?, troop_leader_male = ?, troop_leader_female = ?,
            troop_leader_number_male = ?, troop_leader_number_female = ?,
            headmaster_name = ?, headmaster_number = ?, updated_at = ?
        WHERE guid = ? AND is_delete = 0
        "#,
    )
    .bind(&input.name)
    .bind(&input.sub_district)
    .bind(&input.address)
    .bind(&input.troop_male)
    .bind(&input.troop_female)
    .bind(&input.troop_leader_male)
    .bind(&input.troop_leader_female)
    .bind(&input.troop_leader_number_male)
    .bind(&input.troop_leader_number_female)
    .bind(&input.headmaster_name)
    .bind(&input.headmaster_number)
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await;

    match result {
        Ok(_) => get_active(pool, guid).await,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("institution name already registered".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Soft-delete an institution
pub async fn soft_delete(pool: &SqlitePool, guid: &str) -> Result<()> {
    let result = sqlx::query(
        "UPDATE institutions SET is_delete = 1, updated_at = ? WHERE guid = ? AND is_delete = 0",
    )
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("institution not found".to_string()));
    }
    Ok(())
}

/// Count institutions visible to the caller (dashboard)
pub async fn count(pool: &SqlitePool, scope: &AccessScope) -> Result<i64> {
    let total = match scope.institution() {
        Some(inst) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM institutions WHERE is_delete = 0 AND guid = ?")
                .bind(inst)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM institutions WHERE is_delete = 0")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(total)
}
