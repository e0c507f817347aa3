//! Rank-progression API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use pandu_common::db::models::{RankProgression, TierLevel};
use serde::Deserialize;

use crate::db::progressions::{self, ProgressionListRow, ProgressionSummary};
use crate::error::{ApiError, ApiResult};
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::{progression, AppState};

use super::PagedResponse;

/// Query parameters for the progression list
///
/// The paging fields mirror [`PageQuery`]; query deserialization cannot
/// flatten nested structs, so they are spelled out here.
#[derive(Debug, Deserialize)]
pub struct ProgressionListQuery {
    /// Completed tier to filter on (1, 2, or 3); defaults to tier 1
    #[serde(default = "default_tier")]
    pub tier: i64,

    #[serde(default)]
    pub search: Option<String>,

    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_tier() -> i64 {
    1
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    crate::pagination::DEFAULT_PAGE_SIZE
}

impl ProgressionListQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            search: self.search.clone(),
            page: self.page,
            limit: self.limit,
        }
    }
}

fn tier_from_number(tier: i64) -> Result<TierLevel, ApiError> {
    match tier {
        1 => Ok(TierLevel::Tier1),
        2 => Ok(TierLevel::Tier2),
        3 => Ok(TierLevel::Tier3),
        other => Err(ApiError::BadRequest(format!("invalid tier: {}", other))),
    }
}

/// GET /api/progression
pub async fn list(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ProgressionListQuery>,
) -> ApiResult<Json<PagedResponse<ProgressionListRow>>> {
    let tier = tier_from_number(query.tier)?;
    let page_query = query.page_query();
    let (page, limit, offset) = page_query.window();
    let (data, total) = progressions::list_with_tier(
        &state.db,
        &caller.scope(),
        tier,
        page_query.search_text(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// GET /api/progression/summary
pub async fn summary(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Json<ProgressionSummary>> {
    let summary = progressions::summary(&state.db, &caller.scope()).await?;
    Ok(Json(summary))
}

/// GET /api/progression/:id
pub async fn get(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<ProgressionListRow>> {
    let detail = progressions::get_detail(&state.db, &guid).await?;
    Ok(Json(detail))
}

/// POST /api/progression/tier1 request
#[derive(Debug, Deserialize)]
pub struct IssueTier1Request {
    pub member_guid: String,
}

/// POST /api/progression/tier1
pub async fn issue_tier1(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Json(request): Json<IssueTier1Request>,
) -> ApiResult<(StatusCode, Json<RankProgression>)> {
    let row = progression::issue_tier1(&state.db, &request.member_guid, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/progression/:id/tier2
pub async fn issue_tier2(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<RankProgression>> {
    let row = progression::issue_tier2(&state.db, &guid, Utc::now()).await?;
    Ok(Json(row))
}

/// POST /api/progression/:id/tier3
pub async fn issue_tier3(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<RankProgression>> {
    let row = progression::issue_tier3(&state.db, &guid, Utc::now()).await?;
    Ok(Json(row))
}

/// DELETE /api/progression/:id/tier/:tier
pub async fn revert(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path((guid, tier)): Path<(String, i64)>,
) -> ApiResult<Json<serde_json::Value>> {
    let tier = tier_from_number(tier)?;
    progression::revert_tier(&state.db, &guid, tier).await?;
    Ok(Json(serde_json::json!({ "message": "tier reverted" })))
}
