//! Database initialization
//!
//! Creates the database file on first run and brings the schema up to date.
//! Safe to call on every startup; all statements are idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_institutions_table(&pool).await?;
    create_members_table(&pool).await?;
    create_rank_progressions_table(&pool).await?;
    create_badge_types_table(&pool).await?;
    create_badge_awards_table(&pool).await?;
    create_garuda_awards_table(&pool).await?;
    create_users_table(&pool).await?;
    create_activity_log_table(&pool).await?;
    create_doc_counters_table(&pool).await?;

    // Versioned migrations on top of the baseline schema
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

async fn create_institutions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS institutions (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            sub_district TEXT,
            address TEXT,
            troop_male TEXT,
            troop_female TEXT,
            troop_leader_male TEXT,
            troop_leader_female TEXT,
            troop_leader_number_male TEXT,
            troop_leader_number_female TEXT,
            headmaster_name TEXT,
            headmaster_number TEXT,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            phone TEXT NOT NULL UNIQUE,
            institution_guid TEXT REFERENCES institutions(guid),
            member_number TEXT,
            parent_number TEXT,
            gender TEXT NOT NULL DEFAULT 'other',
            birth_place TEXT,
            birth_date TEXT,
            religion TEXT,
            nationality TEXT,
            village TEXT,
            sub_district TEXT,
            district TEXT,
            province TEXT,
            father_name TEXT,
            mother_name TEXT,
            parent_phone TEXT,
            entry_date TEXT,
            exit_date TEXT,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_members_institution ON members(institution_guid)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_rank_progressions_table(pool: &SqlitePool) -> Result<()> {
    // member_guid is UNIQUE: at most one progression row per member,
    // enforced at the storage layer rather than by application checks alone
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rank_progressions (
            guid TEXT PRIMARY KEY,
            member_guid TEXT NOT NULL UNIQUE REFERENCES members(guid),
            tier1 INTEGER NOT NULL DEFAULT 0,
            tier2 INTEGER NOT NULL DEFAULT 0,
            tier3 INTEGER NOT NULL DEFAULT 0,
            tier1_doc TEXT NOT NULL DEFAULT '',
            tier2_doc TEXT NOT NULL DEFAULT '',
            tier3_doc TEXT NOT NULL DEFAULT '',
            tier1_date TEXT,
            tier2_date TEXT,
            tier3_date TEXT,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_badge_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS badge_types (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            color TEXT,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_badge_awards_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS badge_awards (
            guid TEXT PRIMARY KEY,
            member_guid TEXT NOT NULL REFERENCES members(guid),
            badge_type_guid TEXT NOT NULL REFERENCES badge_types(guid),
            doc_number TEXT NOT NULL DEFAULT '',
            award_date TEXT,
            examiner_name TEXT,
            examiner_position TEXT,
            examiner_address TEXT,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_badge_awards_member ON badge_awards(member_guid)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_garuda_awards_table(pool: &SqlitePool) -> Result<()> {
    // member_guid is UNIQUE: one top-honor award per member for the lifetime
    // of the record, soft-deleted rows included
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS garuda_awards (
            guid TEXT PRIMARY KEY,
            member_guid TEXT NOT NULL UNIQUE REFERENCES members(guid),
            tier_label TEXT NOT NULL,
            badge_count INTEGER NOT NULL DEFAULT 0,
            status INTEGER NOT NULL DEFAULT 0,
            approved_by TEXT,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_digest TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            institution_guid TEXT REFERENCES institutions(guid),
            status INTEGER NOT NULL DEFAULT 1,
            is_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_activity_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activity_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_guid TEXT,
            action TEXT NOT NULL,
            description TEXT NOT NULL,
            module TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_doc_counters_table(pool: &SqlitePool) -> Result<()> {
    // One row per numbering namespace; incremented atomically inside the
    // issuing transaction
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doc_counters (
            namespace TEXT PRIMARY KEY,
            value INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
