//! Badge-award API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use pandu_common::db::models::BadgeAward;

use crate::awards::{self, AwardBadgeRequest};
use crate::db::badges::{self, BadgeListRow};
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::AppState;

use super::PagedResponse;

/// GET /api/badges
pub async fn list(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<BadgeListRow>>> {
    let (page, limit, offset) = query.window();
    let (data, total) = badges::list(
        &state.db,
        &caller.scope(),
        query.search_text(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// GET /api/badges/:id
pub async fn get(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<BadgeListRow>> {
    let detail = badges::get_detail(&state.db, &guid).await?;
    Ok(Json(detail))
}

/// POST /api/badges
pub async fn award(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Json(request): Json<AwardBadgeRequest>,
) -> ApiResult<(StatusCode, Json<BadgeAward>)> {
    let row = awards::award_badge(&state.db, &request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/badges/:id
pub async fn revoke(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    awards::revoke_badge(&state.db, &guid).await?;
    Ok(Json(serde_json::json!({ "message": "badge award revoked" })))
}
