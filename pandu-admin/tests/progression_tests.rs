//! Integration tests for the rank-progression engine
//!
//! Covers the linear tier state machine, the 100-day maturation gate
//! between tier 1 and tier 2 (including its exact boundary), document
//! numbering, and the revert rules.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pandu_admin::db::members::{self, MemberInput};
use pandu_admin::db::{badge_types, institutions, progressions};
use pandu_admin::progression::{
    issue_tier1, issue_tier2, issue_tier3, revert_tier, MIN_DAYS_TIER1_TO_TIER2,
};
use pandu_common::db::models::{Gender, TierLevel};
use pandu_common::db::init_database;
use pandu_common::Error;
use sqlx::SqlitePool;

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

fn member_input(name: &str, institution_guid: Option<String>, gender: Gender) -> MemberInput {
    MemberInput {
        name: name.to_string(),
        phone: format!("08{}", uuid::Uuid::new_v4()),
        institution_guid,
        member_number: None,
        parent_number: None,
        gender: Some(gender),
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
    }
}

async fn seed_member(pool: &SqlitePool, institution_guid: &str, gender: Gender) -> String {
    let input = member_input("Budi", Some(institution_guid.to_string()), gender);
    members::insert(pool, &input).await.unwrap().guid
}

fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

#[tokio::test]
async fn test_issue_tier1_creates_progression() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let now = start_instant();
    let row = issue_tier1(&pool, &member, now).await.unwrap();

    assert!(row.tier1);
    assert!(!row.tier2);
    assert!(!row.tier3);
    assert_eq!(row.tier1_doc, "00001/TKU-BANTU/01.087-A/2026");
    assert_eq!(row.tier1_date, Some(now.date_naive()));
    assert_eq!(row.current_level(), TierLevel::Tier1);
}

#[tokio::test]
async fn test_issue_tier1_uses_female_troop() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Female).await;

    let row = issue_tier1(&pool, &member, start_instant()).await.unwrap();
    assert_eq!(row.tier1_doc, "00001/TKU-BANTU/01.088-A/2026");
}

#[tokio::test]
async fn test_issue_tier1_missing_member_not_found() {
    let (_dir, pool) = setup().await;

    let err = issue_tier1(&pool, "no-such-member", start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_issue_tier1_without_institution_not_found() {
    let (_dir, pool) = setup().await;
    let input = member_input("Tanpa Lembaga", None, Gender::Male);
    let member = members::insert(&pool, &input).await.unwrap().guid;

    let err = issue_tier1(&pool, &member, start_instant()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_issue_tier1_twice_conflicts() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    issue_tier1(&pool, &member, start_instant()).await.unwrap();
    let err = issue_tier1(&pool, &member, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_tier1_numbering_increments_sequentially() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let now = start_instant();

    for expected in ["00001", "00002", "00003"] {
        let member = seed_member(&pool, &inst, Gender::Male).await;
        let row = issue_tier1(&pool, &member, now).await.unwrap();
        assert!(
            row.tier1_doc.starts_with(expected),
            "doc {} should start with {}",
            row.tier1_doc,
            expected
        );
    }
}

#[tokio::test]
async fn test_issue_tier2_rejected_before_100_days() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let start = start_instant();
    let row = issue_tier1(&pool, &member, start).await.unwrap();

    // Same day: 0 elapsed days
    let err = issue_tier2(&pool, &row.guid, start).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    // Boundary: 99 days is still too early
    let at_99 = start + Duration::days(MIN_DAYS_TIER1_TO_TIER2 - 1);
    let err = issue_tier2(&pool, &row.guid, at_99).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_issue_tier2_succeeds_at_exactly_100_days() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let start = start_instant();
    let row = issue_tier1(&pool, &member, start).await.unwrap();

    let at_100 = start + Duration::days(MIN_DAYS_TIER1_TO_TIER2);
    let row = issue_tier2(&pool, &row.guid, at_100).await.unwrap();

    assert!(row.tier2);
    assert_eq!(row.tier2_date, Some(at_100.date_naive()));
    assert_eq!(row.tier2_doc, "00001/TKU-BANTU/01.087-A/2026");
    assert_eq!(row.current_level(), TierLevel::Tier2);
}

#[tokio::test]
async fn test_issue_tier2_twice_conflicts() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let start = start_instant();
    let row = issue_tier1(&pool, &member, start).await.unwrap();
    let later = start + Duration::days(100);
    issue_tier2(&pool, &row.guid, later).await.unwrap();

    let err = issue_tier2(&pool, &row.guid, later).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_issue_tier3_has_no_elapsed_time_gate() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let start = start_instant();
    let row = issue_tier1(&pool, &member, start).await.unwrap();
    let later = start + Duration::days(100);
    issue_tier2(&pool, &row.guid, later).await.unwrap();

    // Immediately after tier 2
    let row = issue_tier3(&pool, &row.guid, later).await.unwrap();
    assert!(row.tier3);
    assert_eq!(row.tier3_doc, "00001/TKU-TATA/01.087-A/2026");
    assert_eq!(row.current_level(), TierLevel::Tier3);
}

#[tokio::test]
async fn test_issue_tier3_requires_tier2() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let row = issue_tier1(&pool, &member, start_instant()).await.unwrap();
    let err = issue_tier3(&pool, &row.guid, start_instant())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_revert_only_allows_current_max_tier() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let start = start_instant();
    let row = issue_tier1(&pool, &member, start).await.unwrap();
    let later = start + Duration::days(100);
    issue_tier2(&pool, &row.guid, later).await.unwrap();
    issue_tier3(&pool, &row.guid, later).await.unwrap();

    // Lower tiers cannot be reverted while tier 3 stands
    let err = revert_tier(&pool, &row.guid, TierLevel::Tier1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
    let err = revert_tier(&pool, &row.guid, TierLevel::Tier2)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");

    // The current maximum can, one step at a time
    revert_tier(&pool, &row.guid, TierLevel::Tier3).await.unwrap();
    let current = progressions::get_active(&pool, &row.guid).await.unwrap();
    assert!(!current.tier3);
    assert!(current.tier3_doc.is_empty());
    assert_eq!(current.tier3_date, None);
    assert_eq!(current.current_level(), TierLevel::Tier2);

    revert_tier(&pool, &row.guid, TierLevel::Tier2).await.unwrap();
    revert_tier(&pool, &row.guid, TierLevel::Tier1).await.unwrap();
    let current = progressions::get_active(&pool, &row.guid).await.unwrap();
    assert_eq!(current.current_level(), TierLevel::None);
}

#[tokio::test]
async fn test_revert_unissued_tier_conflicts() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let row = issue_tier1(&pool, &member, start_instant()).await.unwrap();
    let err = revert_tier(&pool, &row.guid, TierLevel::Tier3)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_reissue_after_revert_reuses_row() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let row = issue_tier1(&pool, &member, start_instant()).await.unwrap();
    revert_tier(&pool, &row.guid, TierLevel::Tier1).await.unwrap();

    let reissued = issue_tier1(&pool, &member, start_instant()).await.unwrap();
    assert_eq!(reissued.guid, row.guid);
    assert!(reissued.tier1);
    // Counter keeps moving: the reissued certificate gets a fresh number
    assert_eq!(reissued.tier1_doc, "00002/TKU-BANTU/01.087-A/2026");
}

#[tokio::test]
async fn test_tier_namespaces_number_independently() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    let start = start_instant();
    let row = issue_tier1(&pool, &member, start).await.unwrap();
    let later = start + Duration::days(100);
    let row = issue_tier2(&pool, &row.guid, later).await.unwrap();
    let row = issue_tier3(&pool, &row.guid, later).await.unwrap();

    // Each tier starts its own sequence at 00001
    assert!(row.tier1_doc.starts_with("00001/"));
    assert!(row.tier2_doc.starts_with("00001/"));
    assert!(row.tier3_doc.starts_with("00001/"));
}

#[tokio::test]
async fn test_exhausted_counter_fails_hard() {
    let (_dir, pool) = setup().await;
    let inst = seed_institution(&pool).await;
    let member = seed_member(&pool, &inst, Gender::Male).await;

    // Push the tier-1 counter to the last printable value
    sqlx::query("INSERT INTO doc_counters (namespace, value) VALUES ('tier1', 99999)")
        .execute(&pool)
        .await
        .unwrap();

    let err = issue_tier1(&pool, &member, start_instant()).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)), "got {err:?}");

    // The failed issuance left no progression row behind
    assert!(progressions::find_by_member(&pool, &member)
        .await
        .unwrap()
        .is_none());
}

// Badge types are unrelated to progression, but the shared database setup
// makes this the convenient place to confirm the catalog round-trips.
#[tokio::test]
async fn test_badge_type_catalog_round_trip() {
    let (_dir, pool) = setup().await;

    let created = badge_types::insert(
        &pool,
        &badge_types::BadgeTypeInput {
            name: "First Aid".to_string(),
            category: Some("health".to_string()),
            color: Some("#ff0000".to_string()),
        },
    )
    .await
    .unwrap();

    let fetched = badge_types::get_active(&pool, &created.guid).await.unwrap();
    assert_eq!(fetched.name, "First Aid");
    assert_eq!(fetched.category.as_deref(), Some("health"));

    badge_types::soft_delete(&pool, &created.guid).await.unwrap();
    assert!(badge_types::find_active(&pool, &created.guid)
        .await
        .unwrap()
        .is_none());
}
