//! Rank progression engine
//!
//! Members advance through three sequential tiers. Transitions are linear,
//! never skip a level, and only the revert operation walks the state back,
//! one step at a time from the current maximum tier.
//!
//! Every issued tier gets a sequential document number from its own
//! numbering namespace, claimed inside the issuing transaction.
//!
//! Operations take `now` as an argument; issued dates and the elapsed-time
//! gate never read the wall clock themselves.

use chrono::{DateTime, Datelike, Utc};
use pandu_common::db::models::{RankProgression, TierLevel};
use pandu_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{institutions, members, progressions};
use crate::numbering::{format_document_number, next_sequence, DocNamespace};

/// Minimum calendar days between tier-1 completion and tier-2 issuance.
/// There is no analogous gate before tier 3.
pub const MIN_DAYS_TIER1_TO_TIER2: i64 = 100;

/// Issue tier 1 for a member, creating the progression record
///
/// The member must exist, must not be soft-deleted, and must not already
/// hold tier 1. A leftover row with tier 1 reverted is reused rather than
/// duplicated.
pub async fn issue_tier1(
    pool: &SqlitePool,
    member_guid: &str,
    now: DateTime<Utc>,
) -> Result<RankProgression> {
    let member = members::get_active(pool, member_guid).await?;
    let institution =
        institutions::get_for_member(pool, member.institution_guid.as_deref()).await?;

    let existing = progressions::find_by_member(pool, member_guid).await?;
    if let Some(row) = &existing {
        if row.tier1 {
            return Err(Error::Conflict("tier 1 already issued".to_string()));
        }
    }

    let unit = institution.troop_for(member.gender).to_string();
    let date = now.date_naive().to_string();
    let timestamp = now.to_rfc3339();

    let mut tx = pool.begin().await?;
    let sequence = next_sequence(&mut tx, DocNamespace::Tier1).await?;
    let doc = format_document_number(sequence, DocNamespace::Tier1, &unit, now.year());

    let guid = match existing {
        Some(row) => {
            sqlx::query(
                "UPDATE rank_progressions
                 SET tier1 = 1, tier1_doc = ?, tier1_date = ?, updated_at = ?
                 WHERE guid = ? AND is_delete = 0",
            )
            .bind(&doc)
            .bind(&date)
            .bind(&timestamp)
            .bind(&row.guid)
            .execute(&mut *tx)
            .await?;
            row.guid.clone()
        }
        None => {
            let guid = Uuid::new_v4().to_string();
            let insert = sqlx::query(
                "INSERT INTO rank_progressions
                     (guid, member_guid, tier1, tier1_doc, tier1_date, created_at, updated_at)
                 VALUES (?, ?, 1, ?, ?, ?, ?)",
            )
            .bind(&guid)
            .bind(member_guid)
            .bind(&doc)
            .bind(&date)
            .bind(&timestamp)
            .bind(&timestamp)
            .execute(&mut *tx)
            .await;

            match insert {
                Ok(_) => guid,
                // A concurrent request created the row first
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    return Err(Error::Conflict("tier 1 already issued".to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    tx.commit().await?;
    progressions::get_active(pool, &guid).await
}

/// Issue tier 2 on an existing progression
///
/// Requires tier 1 complete, tier 2 not yet issued, and at least
/// [`MIN_DAYS_TIER1_TO_TIER2`] calendar days elapsed since the tier-1
/// completion date.
pub async fn issue_tier2(
    pool: &SqlitePool,
    progression_guid: &str,
    now: DateTime<Utc>,
) -> Result<RankProgression> {
    let row = progressions::get_active(pool, progression_guid).await?;
    if !row.tier1 {
        return Err(Error::Conflict("tier 1 not issued".to_string()));
    }
    if row.tier2 {
        return Err(Error::Conflict("tier 2 already issued".to_string()));
    }

    let tier1_date = row
        .tier1_date
        .ok_or_else(|| Error::Validation("tier 1 completion date missing".to_string()))?;
    let elapsed = (now.date_naive() - tier1_date).num_days();
    if elapsed < MIN_DAYS_TIER1_TO_TIER2 {
        return Err(Error::Validation(format!(
            "insufficient elapsed time: {} of {} days since tier 1",
            elapsed, MIN_DAYS_TIER1_TO_TIER2
        )));
    }

    issue_upgrade(pool, &row, DocNamespace::Tier2, now).await
}

/// Issue tier 3 on an existing progression
///
/// Requires tier 2 complete and tier 3 not yet issued. No elapsed-time gate
/// applies between tier 2 and tier 3.
pub async fn issue_tier3(
    pool: &SqlitePool,
    progression_guid: &str,
    now: DateTime<Utc>,
) -> Result<RankProgression> {
    let row = progressions::get_active(pool, progression_guid).await?;
    if !row.tier2 {
        return Err(Error::Conflict("tier 2 not issued".to_string()));
    }
    if row.tier3 {
        return Err(Error::Conflict("tier 3 already issued".to_string()));
    }

    issue_upgrade(pool, &row, DocNamespace::Tier3, now).await
}

/// Shared tier-2/tier-3 issuance: claim a number and set the tier column
async fn issue_upgrade(
    pool: &SqlitePool,
    row: &RankProgression,
    namespace: DocNamespace,
    now: DateTime<Utc>,
) -> Result<RankProgression> {
    let member = members::get_active(pool, &row.member_guid).await?;
    let institution =
        institutions::get_for_member(pool, member.institution_guid.as_deref()).await?;
    let unit = institution.troop_for(member.gender).to_string();

    let column = match namespace {
        DocNamespace::Tier2 => "tier2",
        DocNamespace::Tier3 => "tier3",
        _ => return Err(Error::Internal("not a tier namespace".to_string())),
    };

    let mut tx = pool.begin().await?;
    let sequence = next_sequence(&mut tx, namespace).await?;
    let doc = format_document_number(sequence, namespace, &unit, now.year());

    let sql = format!(
        "UPDATE rank_progressions
         SET {col} = 1, {col}_doc = ?, {col}_date = ?, updated_at = ?
         WHERE guid = ? AND is_delete = 0",
        col = column
    );
    sqlx::query(&sql)
        .bind(&doc)
        .bind(now.date_naive().to_string())
        .bind(now.to_rfc3339())
        .bind(&row.guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    progressions::get_active(pool, &row.guid).await
}

/// Revert the current maximum tier
///
/// Only the highest currently-true tier may be cleared; reverting a lower
/// tier while a higher one stands is rejected, as is reverting a tier that
/// was never issued.
pub async fn revert_tier(
    pool: &SqlitePool,
    progression_guid: &str,
    tier: TierLevel,
) -> Result<()> {
    let column = match tier {
        TierLevel::None => {
            return Err(Error::Validation("no tier selected".to_string()));
        }
        TierLevel::Tier1 => "tier1",
        TierLevel::Tier2 => "tier2",
        TierLevel::Tier3 => "tier3",
    };

    let row = progressions::get_active(pool, progression_guid).await?;
    let current = row.current_level();

    if current == TierLevel::None {
        return Err(Error::Conflict("no tier issued".to_string()));
    }
    if tier < current {
        return Err(Error::Conflict(
            "cannot delete: higher tier present".to_string(),
        ));
    }
    if tier > current {
        return Err(Error::Conflict("tier not issued".to_string()));
    }

    let sql = format!(
        "UPDATE rank_progressions
         SET {col} = 0, {col}_doc = '', {col}_date = NULL, updated_at = ?
         WHERE guid = ? AND is_delete = 0",
        col = column
    );
    sqlx::query(&sql)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(progression_guid)
        .execute(pool)
        .await?;

    Ok(())
}
