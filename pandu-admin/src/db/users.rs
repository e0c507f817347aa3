//! User account queries
//!
//! Session and token handling live upstream; this module only manages the
//! account records themselves.

use pandu_common::db::models::User;
use pandu_common::password::hash_password;
use pandu_common::scope::Role;
use pandu_common::{Error, Result};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{like_pattern, now_timestamp};

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub institution_guid: Option<String>,
}

pub(crate) fn user_from_row(row: &SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        guid: row.get("guid"),
        name: row.get("name"),
        email: row.get("email"),
        role: Role::parse(&role).unwrap_or(Role::User),
        institution_guid: row.get("institution_guid"),
        status: row.get("status"),
    }
}

/// Find a user by guid, excluding soft-deleted rows
pub async fn find_active(pool: &SqlitePool, guid: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE guid = ? AND is_delete = 0")
        .bind(guid)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

/// Like [`find_active`], but a missing user is an error
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<User> {
    find_active(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound("user not found".to_string()))
}

/// Searched, paged user listing
pub async fn list(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<User>, i64)> {
    let mut filter = String::from(" FROM users WHERE is_delete = 0");
    if search.is_some() {
        filter.push_str(" AND (name LIKE ? OR email LIKE ?)");
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

    Ok((rows.iter().map(user_from_row).collect(), total))
}

/// Register a new account
///
/// New accounts start pending (status 0) until an admin approves them. An
/// institution may hold only one account.
pub async fn register(pool: &SqlitePool, input: &RegisterUserInput) -> Result<User> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT guid FROM users WHERE email = ? AND is_delete = 0")
            .bind(&input.email)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(Error::Conflict("email already registered".to_string()));
    }

    if let Some(inst) = input.institution_guid.as_deref().filter(|s| !s.is_empty()) {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT guid FROM users WHERE institution_guid = ? AND is_delete = 0")
                .bind(inst)
                .fetch_optional(pool)
                .await?;
        if existing.is_some() {
            return Err(Error::Conflict(
                "institution already has a registered user".to_string(),
            ));
        }
    }

    let guid = Uuid::new_v4().to_string();
    let now = now_timestamp();
    let role = input.role.unwrap_or(Role::User);

    let result = sqlx::query(
        r#"
        INSERT INTO users (guid, name, email, password_digest, role, institution_guid,
                           status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.name)
    .bind(&input.email)
    .bind(hash_password(&input.password))
    .bind(role.as_str())
    .bind(&input.institution_guid)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => get_active(pool, &guid).await,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("email already registered".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Toggle an account between active (1) and suspended (0)
pub async fn toggle_status(pool: &SqlitePool, guid: &str) -> Result<User> {
    let user = get_active(pool, guid).await?;
    let new_status = if user.status == 1 { 0 } else { 1 };

    sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE guid = ? AND is_delete = 0")
        .bind(new_status)
        .bind(now_timestamp())
        .bind(guid)
        .execute(pool)
        .await?;

    get_active(pool, guid).await
}

/// Soft-delete an account
pub async fn soft_delete(pool: &SqlitePool, guid: &str) -> Result<()> {
    let result = sqlx::query(
        "UPDATE users SET is_delete = 1, updated_at = ? WHERE guid = ? AND is_delete = 0",
    )
    .bind(now_timestamp())
    .bind(guid)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("user not found".to_string()));
    }
    Ok(())
}
