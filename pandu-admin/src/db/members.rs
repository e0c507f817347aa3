//! Member queries

use pandu_common::db::models::{Gender, Member};
use pandu_common::{AccessScope, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{like_pattern, now_timestamp, opt_date};

/// Caller-supplied member fields, shared by create and update
#[derive(Debug, Clone, Deserialize)]
pub struct MemberInput {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub institution_guid: Option<String>,
    #[serde(default)]
    pub member_number: Option<String>,
    #[serde(default)]
    pub parent_number: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth_place: Option<String>,
    #[serde(default)]
    pub birth_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub sub_district: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
    #[serde(default)]
    pub entry_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub exit_date: Option<chrono::NaiveDate>,
}

/// Member row joined with its institution name for list views
#[derive(Debug, Clone, Serialize)]
pub struct MemberListRow {
    #[serde(flatten)]
    pub member: Member,
    pub institution_name: Option<String>,
}

pub(crate) fn member_from_row(row: &SqliteRow) -> Member {
    let gender: String = row.get("gender");
    Member {
        guid: row.get("guid"),
        name: row.get("name"),
        phone: row.get("phone"),
        institution_guid: row.get("institution_guid"),
        member_number: row.get("member_number"),
        parent_number: row.get("parent_number"),
        gender: Gender::parse(&gender),
        birth_place: row.get("birth_place"),
        birth_date: opt_date(row, "birth_date"),
        religion: row.get("religion"),
        nationality: row.get("nationality"),
        village: row.get("village"),
        sub_district: row.get("sub_district"),
        district: row.get("district"),
        province: row.get("province"),
        father_name: row.get("father_name"),
        mother_name: row.get("mother_name"),
        parent_phone: row.get("parent_phone"),
        entry_date: opt_date(row, "entry_date"),
        exit_date: opt_date(row, "exit_date"),
    }
}

/// Find a member by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<Member>> {
    let row = sqlx::query("SELECT * FROM members WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(member_from_row))
}

/// Like [`find_active`], but a missing member is an error
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<Member> {
    find_active(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound("member not found".to_string()))
}

/// Scoped, searched, paged member listing
pub async fn list(
    pool: &SqlitePool,
    scope: &AccessScope,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<MemberListRow>, i64)> {
    let mut filter = String::from(" FROM members m
         LEFT JOIN institutions i ON i.guid = m.institution_guid
         WHERE m.is_delete = 0");
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
        "SELECT m.*, i.name AS institution_name{} ORDER BY m.name LIMIT ? OFFSET ?",
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
        .map(|row| MemberListRow {
            member: member_from_row(row),
            institution_name: row.get("institution_name"),
        })
        .collect();

    Ok((data, total))
}

/// Insert a new member; the phone number must not already be registered
pub async fn insert(pool: &SqlitePool, input: &MemberInput) -> Result<Member> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT guid FROM members WHERE phone = ? AND is_delete = 0")
            .bind(&input.phone)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(Error::Conflict("phone number already registered".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    let now = now_timestamp();
    let gender = input.gender.unwrap_or(Gender::Other);

    let result = sqlx::query(
        r#"
        INSERT INTO members (
            guid, name, phone, institution_guid, member_number, parent_number,
            gender, birth_place, birth_date, religion, nationality, village,
            sub_district, district, province, father_name, mother_name,
            parent_phone, entry_date, exit_date, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.name)
    .bind(&input.phone)
    .bind(&input.institution_guid)
    .bind(&input.member_number)
    .bind(&input.parent_number)
    .bind(gender.as_str())
    .bind(&input.birth_place)
    .bind(input.birth_date.map(|d| d.to_string()))
    .bind(&input.religion)
    .bind(&input.nationality)
    .bind(&input.village)
    .bind(&input.sub_district)
    .bind(&input.district)
    .bind(&input.province)
    .bind(&input.father_name)
    .bind(&input.mother_name)
    .bind(&input.parent_phone)
    .bind(input.entry_date.map(|d| d.to_string()))
    .bind(input.exit_date.map(|d| d.to_string()))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => get_active(pool, &guid).await,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("phone number already registered".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Update an existing member's fields
pub async fn update(pool: &SqlitePool, guid: &str, input: &MemberInput) -> Result<Member> {
    get_active(pool, guid).await?;
    let gender = input.gender.unwrap_or(Gender::Other);

    sqlx::query(
        r#"
        UPDATE members SET
            name = ?, phone = ?, institution_guid = ?, member_number = ?,
            parent_number = ?, gender = ?, birth_place = ?, birth_date = ?,
            religion = ?, nationality = ?, village = ?, sub_district = ?,
            district = ?, province = ?, father_name = ?, mother_name = ?,
            parent_phone = ?, entry_date = ?, exit_date = ?, updated_at = ?
        WHERE guid = ? AND is_delete = 0
        "#,
    )
    .bind(&input.name)
    .bind(&input.phone)
    .bind(&input.institution_guid)
    .bind(&input.member_number)
    .bind(&input.parent_number)
    .bind(gender.as_str())
    .bind(&input.birth_place)
    .bind(input.birth_date.map(|d| d.to_string()))
    .bind(&input.religion)
    .bind(&input.nationality)
    .bind(&input.village)
    .bind(&input.sub_district)
    .bind(&input.district)
    .bind(&input.province)
    .bind(&input.father_name)
    .bind(&input.mother_name)
    .bind(&input.parent_phone)
    .bind(input.entry_date.map(|d| d.to_string()))
    .bind(input.exit_date.map(|d| d.to_string()))
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await?;

    get_active(pool, guid).await
}

/// Soft-delete a member
pub async fn soft_delete(pool: &SqlitePool, guid: &str) -> Result<()> {
    let result = sqlx::query(
        "UPDATE members SET is_delete = 1, updated_at = ? WHERE guid = ? AND is_delete = 0",
    )
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("member not found".to_string()));
    }
    Ok(())
}

/// Count members under the caller's scope (dashboard)
pub async fn count(pool: &SqlitePool, scope: &AccessScope) -> Result<i64> {
    let total = match scope.institution() {
        Some(inst) => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM members WHERE is_delete = 0 AND institution_guid = ?",
            )
            .bind(inst)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE is_delete = 0")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(total)
}
