//! Institution API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pandu_common::db::models::Institution;

use crate::db::institutions::{self, InstitutionInput};
use crate::db::logs;
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::AppState;

use super::PagedResponse;

/// GET /api/institutions
pub async fn list(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<Institution>>> {
    let (page, limit, offset) = query.window();
    let (data, total) =
        institutions::list(&state.db, query.search_text(), limit, offset).await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// GET /api/institutions/:id
pub async fn get(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<Institution>> {
    let institution = institutions::get_active(&state.db, &guid).await?;
    Ok(Json(institution))
}

/// POST /api/institutions
pub async fn create(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(input): Json<InstitutionInput>,
) -> ApiResult<(StatusCode, Json<Institution>)> {
    let institution = institutions::insert(&state.db, &input).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "create",
        "Institution",
        format!("Added institution {}", institution.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(institution)))
}

/// PATCH /api/institutions/:id
pub async fn update(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
    Json(input): Json<InstitutionInput>,
) -> ApiResult<Json<Institution>> {
    let institution = institutions::update(&state.db, &guid, &input).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "update",
        "Institution",
        format!("Updated institution {}", institution.name),
    )
    .await;
    Ok(Json(institution))
}

/// DELETE /api/institutions/:id
pub async fn remove(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    institutions::soft_delete(&state.db, &guid).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "delete",
        "Institution",
        format!("Deleted institution {}", guid),
    )
    .await;
    Ok(Json(serde_json::json!({ "message": "institution deleted" })))
}
