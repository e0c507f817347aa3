//! Badge-type catalog API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pandu_common::db::models::BadgeType;

use crate::db::badge_types::{self, BadgeTypeInput};
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::AppState;

use super::PagedResponse;

/// GET /api/badge-types
pub async fn list(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<BadgeType>>> {
    let (page, limit, offset) = query.window();
    let (data, total) =
        badge_types::list(&state.db, query.search_text(), limit, offset).await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// GET /api/badge-types/:id
pub async fn get(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<BadgeType>> {
    let badge_type = badge_types::get_active(&state.db, &guid).await?;
    Ok(Json(badge_type))
}

/// POST /api/badge-types
pub async fn create(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Json(input): Json<BadgeTypeInput>,
) -> ApiResult<(StatusCode, Json<BadgeType>)> {
    let badge_type = badge_types::insert(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(badge_type)))
}

/// PATCH /api/badge-types/:id
pub async fn update(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
    Json(input): Json<BadgeTypeInput>,
) -> ApiResult<Json<BadgeType>> {
    let badge_type = badge_types::update(&state.db, &guid, &input).await?;
    Ok(Json(badge_type))
}

/// DELETE /api/badge-types/:id
pub async fn remove(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    badge_types::soft_delete(&state.db, &guid).await?;
    Ok(Json(serde_json::json!({ "message": "badge type deleted" })))
}
