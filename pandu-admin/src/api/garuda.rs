//! Top-honor (Garuda) award API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use pandu_common::db::models::GarudaAward;
use serde::Deserialize;

use crate::awards;
use crate::db::garuda::{self, GarudaListRow, GarudaSummary};
use crate::db::logs;
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::AppState;

use super::PagedResponse;

/// GET /api/garuda
pub async fn list(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<GarudaListRow>>> {
    let (page, limit, offset) = query.window();
    let (data, total) = garuda::list(
        &state.db,
        &caller.scope(),
        query.search_text(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// GET /api/garuda/summary
pub async fn summary(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Json<GarudaSummary>> {
    let summary = garuda::summary(&state.db, &caller.scope()).await?;
    Ok(Json(summary))
}

/// GET /api/garuda/:id
pub async fn get(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<GarudaListRow>> {
    let detail = garuda::get_detail(&state.db, &guid).await?;
    Ok(Json(detail))
}

/// POST /api/garuda request
#[derive(Debug, Deserialize)]
pub struct RequestGarudaRequest {
    pub member_guid: String,
}

/// POST /api/garuda
pub async fn request(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<RequestGarudaRequest>,
) -> ApiResult<(StatusCode, Json<GarudaAward>)> {
    let row = awards::request_garuda(&state.db, &request.member_guid, Utc::now()).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "create",
        "Garuda",
        format!("Registered garuda award for member {}", request.member_guid),
    )
    .await;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/garuda/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<GarudaAward>> {
    let row = awards::approve_garuda(&state.db, &guid, &caller.name, caller.role).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "update",
        "Garuda",
        format!("Approved garuda award {}", guid),
    )
    .await;
    Ok(Json(row))
}

/// DELETE /api/garuda/:id
pub async fn remove(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    awards::delete_garuda(&state.db, &guid).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "delete",
        "Garuda",
        format!("Deleted garuda award {}", guid),
    )
    .await;
    Ok(Json(serde_json::json!({ "message": "garuda award deleted" })))
}
