//! Badge and top-honor award engine
//!
//! Proficiency badges require the first two progression tiers. The Garuda
//! top honor requires a completed tier 3 plus a minimum spread of badge
//! categories, is granted at most once per member, and moves one-way
//! through a pending → approved lifecycle with a single super-admin
//! approver.

use chrono::{DateTime, Datelike, Utc};
use pandu_common::db::models::{BadgeAward, GarudaAward, GarudaStatus, TierLevel};
use pandu_common::scope::Role;
use pandu_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{badge_types, badges, garuda, institutions, members, progressions};
use crate::numbering::{format_document_number, next_sequence, DocNamespace};

/// Minimum badge awards required in every category the member holds before
/// the top honor can be requested
pub const MIN_BADGES_PER_CATEGORY: i64 = 4;

/// Badge award payload
#[derive(Debug, Clone, Deserialize)]
pub struct AwardBadgeRequest {
    pub member_guid: String,
    pub badge_type_guid: String,
    #[serde(default)]
    pub examiner_name: Option<String>,
    #[serde(default)]
    pub examiner_position: Option<String>,
    #[serde(default)]
    pub examiner_address: Option<String>,
}

/// Award a proficiency badge to a member
///
/// The member's progression must have both tier 1 and tier 2 complete;
/// tier 3 is not required.
pub async fn award_badge(
    pool: &SqlitePool,
    request: &AwardBadgeRequest,
    now: DateTime<Utc>,
) -> Result<BadgeAward> {
    let member = members::get_active(pool, &request.member_guid).await?;
    let institution =
        institutions::get_for_member(pool, member.institution_guid.as_deref()).await?;
    badge_types::get_active(pool, &request.badge_type_guid).await?;

    let eligible = progressions::find_by_member(pool, &request.member_guid)
        .await?
        .map(|p| p.tier1 && p.tier2)
        .unwrap_or(false);
    if !eligible {
        return Err(Error::Validation(
            "tier 1 and tier 2 must be completed before awarding a badge".to_string(),
        ));
    }

    let unit = institution.troop_for(member.gender).to_string();
    let guid = Uuid::new_v4().to_string();
    let timestamp = now.to_rfc3339();

    let mut tx = pool.begin().await?;
    let sequence = next_sequence(&mut tx, DocNamespace::Badge).await?;
    let doc = format_document_number(sequence, DocNamespace::Badge, &unit, now.year());

    sqlx::query(
        r#"
        INSERT INTO badge_awards
            (guid, member_guid, badge_type_guid, doc_number, award_date,
             examiner_name, examiner_position, examiner_address,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&request.member_guid)
    .bind(&request.badge_type_guid)
    .bind(&doc)
    .bind(now.date_naive().to_string())
    .bind(&request.examiner_name)
    .bind(&request.examiner_position)
    .bind(&request.examiner_address)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    badges::find_active(pool, &guid)
        .await?
        .ok_or_else(|| Error::Internal("badge award vanished after insert".to_string()))
}

/// Revoke a badge award
///
/// Clears the document number and award date but keeps the row, so issued
/// numbering stays auditable.
pub async fn revoke_badge(pool: &SqlitePool, badge_guid: &str) -> Result<()> {
    badges::find_active(pool, badge_guid)
        .await?
        .ok_or_else(|| Error::NotFound("badge award not found".to_string()))?;

    sqlx::query(
        "UPDATE badge_awards
         SET doc_number = '', award_date = NULL, is_delete = 1, updated_at = ?
         WHERE guid = ? AND is_delete = 0",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(badge_guid)
    .execute(pool)
    .await?;

    Ok(())
}

/// Register a member for the Garuda top honor
///
/// Requires a completed tier 3 and, across the member's non-deleted badge
/// awards grouped by badge-type category, at least one category present
/// with no category holding fewer than [`MIN_BADGES_PER_CATEGORY`] awards.
/// A member registers at most once; earlier rows block re-registration even
/// after soft-deletion.
pub async fn request_garuda(
    pool: &SqlitePool,
    member_guid: &str,
    now: DateTime<Utc>,
) -> Result<GarudaAward> {
    members::get_active(pool, member_guid).await?;

    let level = progressions::find_by_member(pool, member_guid)
        .await?
        .map(|p| p.current_level())
        .unwrap_or(TierLevel::None);
    if level != TierLevel::Tier3 {
        return Err(Error::Validation(
            "requirements not met: tier 3 must be completed".to_string(),
        ));
    }

    let categories = badges::category_counts(pool, member_guid).await?;
    let category_short = categories
        .iter()
        .any(|c| c.count < MIN_BADGES_PER_CATEGORY);
    if categories.is_empty() || category_short {
        return Err(Error::Validation(format!(
            "requirements not met: every badge category must hold at least {} awards",
            MIN_BADGES_PER_CATEGORY
        )));
    }

    if garuda::exists_for_member(pool, member_guid).await? {
        return Err(Error::Conflict("already registered".to_string()));
    }

    let badge_count = badges::count_for_member(pool, member_guid).await?;
    let tier_label = level.label().unwrap_or_default();
    let guid = Uuid::new_v4().to_string();
    let timestamp = now.to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO garuda_awards
            (guid, member_guid, tier_label, badge_count, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(member_guid)
    .bind(tier_label)
    .bind(badge_count)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await;

    match result {
        Ok(_) => garuda::get_active(pool, &guid).await,
        // A concurrent request registered the member first
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("already registered".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Approve a pending Garuda award
///
/// Only a super-admin may approve; approval is one-way and records the
/// approver's name.
pub async fn approve_garuda(
    pool: &SqlitePool,
    garuda_guid: &str,
    approver_name: &str,
    caller_role: Role,
) -> Result<GarudaAward> {
    if caller_role != Role::SuperAdmin {
        return Err(Error::Authorization(
            "only a super admin can approve a garuda award".to_string(),
        ));
    }

    let award = garuda::get_active(pool, garuda_guid).await?;
    if award.status == GarudaStatus::Approved {
        return Err(Error::Conflict("award already approved".to_string()));
    }

    sqlx::query(
        "UPDATE garuda_awards SET status = 1, approved_by = ?, updated_at = ?
         WHERE guid = ? AND is_delete = 0",
    )
    .bind(approver_name)
    .bind(Utc::now().to_rfc3339())
    .bind(garuda_guid)
    .execute(pool)
    .await?;

    garuda::get_active(pool, garuda_guid).await
}

/// Soft-delete a pending Garuda award
///
/// Approved awards are immutable and cannot be deleted.
pub async fn delete_garuda(pool: &SqlitePool, garuda_guid: &str) -> Result<()> {
    let award = garuda::get_active(pool, garuda_guid).await?;
    if award.status == GarudaStatus::Approved {
        return Err(Error::Conflict("cannot delete approved award".to_string()));
    }

    sqlx::query(
        "UPDATE garuda_awards SET is_delete = 1, updated_at = ? WHERE guid = ? AND is_delete = 0",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(garuda_guid)
    .execute(pool)
    .await?;

    Ok(())
}
