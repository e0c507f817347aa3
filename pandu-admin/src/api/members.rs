//! Member API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pandu_common::db::models::Member;

use crate::db::logs;
use crate::db::members::{self, MemberInput, MemberListRow};
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::AppState;

use super::PagedResponse;

/// GET /api/members
pub async fn list(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<MemberListRow>>> {
    let (page, limit, offset) = query.window();
    let (data, total) = members::list(
        &state.db,
        &caller.scope(),
        query.search_text(),
        limit,
        offset,
    )
    .await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// GET /api/members/:id
pub async fn get(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<Member>> {
    let member = members::get_active(&state.db, &guid).await?;
    Ok(Json(member))
}

/// POST /api/members
pub async fn create(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(input): Json<MemberInput>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let member = members::insert(&state.db, &input).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "create",
        "Member",
        format!("Added member {}", member.name),
    )
    .await;
    Ok((StatusCode::CREATED, Json(member)))
}

/// PATCH /api/members/:id
pub async fn update(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
    Json(input): Json<MemberInput>,
) -> ApiResult<Json<Member>> {
    let member = members::update(&state.db, &guid, &input).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "update",
        "Member",
        format!("Updated member {}", member.name),
    )
    .await;
    Ok(Json(member))
}

/// DELETE /api/members/:id
pub async fn remove(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    members::soft_delete(&state.db, &guid).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "delete",
        "Member",
        format!("Deleted member {}", guid),
    )
    .await;
    Ok(Json(serde_json::json!({ "message": "member deleted" })))
}
