//! Integration tests for the badge and top-honor award engine
//!
//! Covers the badge prerequisite matrix, revocation, the category-count
//! eligibility boundary for the Garuda award, the one-award-per-member
//! rule, and the pending → approved lifecycle.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pandu_admin::awards::{
    approve_garuda, award_badge, delete_garuda, request_garuda, revoke_badge,
    AwardBadgeRequest, MIN_BADGES_PER_CATEGORY,
};
use pandu_admin::db::members::{self, MemberInput};
use pandu_admin::db::{badge_types, badges, garuda, institutions};
use pandu_admin::progression::{issue_tier1, issue_tier2, issue_tier3};
use pandu_common::db::init_database;
use pandu_common::db::models::{Gender, GarudaStatus};
use pandu_common::scope::Role;
use pandu_common::Error;
use sqlx::{Row, SqlitePool};

async fn setup() -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("pandu.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

async fn seed_institution(pool: &SqlitePool) -> String {
    let input = institutions::InstitutionInput {
        name: format!("SDN {}", uuid::Uuid::new_v4()),
        sub_district: None,
        address: None,
        troop_male: Some("01.087".to_string()),
        troop_female: Some("01.088".to_string()),
        troop_leader_male: None,
        troop_leader_female: None,
        troop_leader_number_male: None,
        troop_leader_number_female: None,
        headmaster_name: None,
        headmaster_number: None,
    };
    institutions::insert(pool, &input).await.unwrap().guid
}

async fn seed_member(pool: &SqlitePool, institution_guid: &str) -> String {
    let input = MemberInput {
        name: "Siti".to_string(),
        phone: format!("08{}", uuid::Uuid::new_v4()),
        institution_guid: Some(institution_guid.to_string()),
        member_number: None,
        parent_number: None,
        gender: Some(Gender::Female),
        birth_place: None,
        birth_date: None,
        religion: None,
        nationality: None,
        village: None,
        sub_district: None,
        district: None,
        province: None,
        father_name: None,
        mother_name: None,
        parent_phone: None,
        entry_date: None,
        exit_date: None,
    };
    members::insert(pool, &input).await.unwrap().guid
}

async fn seed_badge_type(pool: &SqlitePool, name: &str, category: &str) -> String {
    badge_types::insert(
        pool,
        &badge_types::BadgeTypeInput {
            name: name.to_string(),
            category: Some(category.to_string()),
            color: None,
        },
    )
    .await
    .unwrap()
    .guid
}

fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

/// Walk a member to tier 2 (the badge prerequisite)
async fn advance_to_tier2(pool: &SqlitePool, member: &str) -> String {
    let start = start_instant();
    let row = issue_tier1(pool, member, start).await.unwrap();
    issue_tier2(pool, &row.guid, start + Duration::days(100))
        .await
        .unwrap();
    row.guid
}

/// Walk a member all the way to tier 3 (the top-honor prerequisite)
async fn advance_to_tier3(pool: &SqlitePool, member: &str) -> String {
    let guid = advance_to_tier2(pool, member).await;
    issue_tier3(pool, &guid, start_instant() + Duration::days(100))
        .await
        .unwrap();
    guid
}

fn badge_request(member: &str, badge_type: &str) -> AwardBadgeRequest {
    AwardBadgeRequest {
        member_guid: member.to_string(),
        badge_type_guid: badge_type.to_string(),
        examiner_name: Some("Pak Harun".to_string()),
        examiner_position: Some("Examiner".to_string()),
        examiner_address: None,
    }
}

#[tokio::test]
async fn test_award_badge_requires_tier1_and_tier2() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    let badge_type = seed_badge_type(&pool, "First Aid", "health").await;
    let now = start_instant();

    // No progression at all
    let err = award_badge(&pool, &badge_request(&member, &badge_type), now)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    // Tier 1 only
    issue_tier1(&pool, &member, now).await.unwrap();
    let err = award_badge(&pool, &badge_request(&member, &badge_type), now)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_award_badge_succeeds_at_tier2() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    let badge_type = seed_badge_type(&pool, "First Aid", "health").await;
    advance_to_tier2(&pool, &member).await;

    let now = start_instant() + Duration::days(100);
    let award = award_badge(&pool, &badge_request(&member, &badge_type), now)
        .await
        .unwrap();

    assert_eq!(award.doc_number, "00001/TKK-SIAGA/01.088-A/2026");
    assert_eq!(award.award_date, Some(now.date_naive()));
    assert_eq!(award.member_guid, member);
}

#[tokio::test]
async fn test_award_badge_unknown_type_not_found() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier2(&pool, &member).await;

    let err = award_badge(
        &pool,
        &badge_request(&member, "no-such-type"),
        start_instant(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_revoke_badge_clears_number_but_keeps_row() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    let badge_type = seed_badge_type(&pool, "First Aid", "health").await;
    advance_to_tier2(&pool, &member).await;
    let now = start_instant() + Duration::days(100);

    let award = award_badge(&pool, &badge_request(&member, &badge_type), now)
        .await
        .unwrap();
    revoke_badge(&pool, &award.guid).await.unwrap();

    // Gone from active reads
    assert!(badges::find_active(&pool, &award.guid).await.unwrap().is_none());

    // The row survives with number and date cleared
    let row = sqlx::query("SELECT doc_number, award_date, is_delete FROM badge_awards WHERE guid = ?")
        .bind(&award.guid)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("doc_number"), "");
    assert_eq!(row.get::<Option<String>, _>("award_date"), None);
    assert_eq!(row.get::<i64, _>("is_delete"), 1);

    // Numbering keeps moving past the revoked award
    let next = award_badge(&pool, &badge_request(&member, &badge_type), now)
        .await
        .unwrap();
    assert_eq!(next.doc_number, "00002/TKK-SIAGA/01.088-A/2026");
}

#[tokio::test]
async fn test_revoke_badge_twice_not_found() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    let badge_type = seed_badge_type(&pool, "First Aid", "health").await;
    advance_to_tier2(&pool, &member).await;

    let award = award_badge(
        &pool,
        &badge_request(&member, &badge_type),
        start_instant() + Duration::days(100),
    )
    .await
    .unwrap();
    revoke_badge(&pool, &award.guid).await.unwrap();

    let err = revoke_badge(&pool, &award.guid).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

/// Award `count` badges of one category to a member
async fn award_category(pool: &SqlitePool, member: &str, category: &str, count: i64) {
    let now = start_instant() + Duration::days(150);
    for i in 0..count {
        let badge_type =
            seed_badge_type(pool, &format!("{} {}", category, i), category).await;
        award_badge(pool, &badge_request(member, &badge_type), now)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_request_garuda_requires_tier3() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier2(&pool, &member).await;
    award_category(&pool, &member, "health", MIN_BADGES_PER_CATEGORY).await;

    let err = request_garuda(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_request_garuda_rejects_short_category() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;

    // health: 4, craft: 3 - one short category blocks the whole request
    award_category(&pool, &member, "health", 4).await;
    award_category(&pool, &member, "craft", 3).await;

    let err = request_garuda(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_request_garuda_rejects_without_any_badges() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;

    let err = request_garuda(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_request_garuda_single_full_category_succeeds() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;

    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();
    assert_eq!(award.status, GarudaStatus::Pending);
    assert_eq!(award.tier_label, "TATA");
    assert_eq!(award.badge_count, 4);
    assert_eq!(award.approved_by, None);
}

#[tokio::test]
async fn test_request_garuda_two_full_categories_succeed() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;
    award_category(&pool, &member, "craft", 4).await;

    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();
    assert_eq!(award.badge_count, 8);
}

#[tokio::test]
async fn test_request_garuda_ignores_revoked_badges() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;

    // Revoking one badge drops the category below the threshold
    let (rows, _) = badges::list(
        &pool,
        &pandu_common::AccessScope::All,
        None,
        10,
        0,
    )
    .await
    .unwrap();
    revoke_badge(&pool, &rows[0].award.guid).await.unwrap();

    let err = request_garuda(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_request_garuda_twice_conflicts() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;

    request_garuda(&pool, &member, start_instant()).await.unwrap();
    let err = request_garuda(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_deleted_garuda_still_blocks_reregistration() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;

    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();
    delete_garuda(&pool, &award.guid).await.unwrap();

    let err = request_garuda(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_approve_garuda_requires_super_admin() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;
    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();

    for role in [Role::User, Role::Admin] {
        let err = approve_garuda(&pool, &award.guid, "Kak Seto", role)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authorization(_)), "got {err:?}");
    }

    let approved = approve_garuda(&pool, &award.guid, "Kak Seto", Role::SuperAdmin)
        .await
        .unwrap();
    assert_eq!(approved.status, GarudaStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some("Kak Seto"));
}

#[tokio::test]
async fn test_approve_garuda_is_one_way() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;
    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();

    approve_garuda(&pool, &award.guid, "Kak Seto", Role::SuperAdmin)
        .await
        .unwrap();
    let err = approve_garuda(&pool, &award.guid, "Kak Seto", Role::SuperAdmin)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_approved_garuda_cannot_be_deleted() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;
    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();

    approve_garuda(&pool, &award.guid, "Kak Seto", Role::SuperAdmin)
        .await
        .unwrap();
    let err = delete_garuda(&pool, &award.guid).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");

    // Still readable
    let still_there = garuda::get_active(&pool, &award.guid).await.unwrap();
    assert_eq!(still_there.status, GarudaStatus::Approved);
}

#[tokio::test]
async fn test_pending_garuda_can_be_deleted() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    advance_to_tier3(&pool, &member).await;
    award_category(&pool, &member, "health", 4).await;
    let award = request_garuda(&pool, &member, start_instant()).await.unwrap();

    delete_garuda(&pool, &award.guid).await.unwrap();
    assert!(garuda::find_active(&pool, &award.guid).await.unwrap().is_none());
}

/// End-to-end walk from no progression to an approved top honor
#[tokio::test]
async fn test_full_scenario_none_to_garuda() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst).await;
    let start = start_instant();

    // Tier 1 issues the first certificate
    let row = issue_tier1(&pool, &member, start).await.unwrap();
    assert!(row.tier1_doc.starts_with("00001/"));

    // Tier 2 immediately fails the elapsed-time gate
    let err = issue_tier2(&pool, &row.guid, start).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    // Advance the clock 100 days and both upgrades go through
    let later = start + Duration::days(100);
    issue_tier2(&pool, &row.guid, later).await.unwrap();
    issue_tier3(&pool, &row.guid, later).await.unwrap();

    // Four full categories satisfy the top-honor rule
    for category in ["health", "craft", "nature", "civic"] {
        let badge_type = seed_badge_type(&pool, category, category).await;
        for _ in 0..4 {
            award_badge(&pool, &badge_request(&member, &badge_type), later)
                .await
                .unwrap();
        }
    }

    let award = request_garuda(&pool, &member, later).await.unwrap();
    assert_eq!(award.status, GarudaStatus::Pending);
    assert_eq!(award.badge_count, 16);

    let err = request_garuda(&pool, &member, later).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");

    let approved = approve_garuda(&pool, &award.guid, "Kak Seto", Role::SuperAdmin)
        .await
        .unwrap();
    assert_eq!(approved.status, GarudaStatus::Approved);
}
