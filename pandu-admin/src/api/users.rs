//! User-account API
//!
//! Registration is open (the upstream session layer has no identity to
//! assert yet); every other operation requires an admin caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pandu_common::db::models::User;

use crate::db::logs;
use crate::db::users::{self, RegisterUserInput};
use crate::error::{ApiError, ApiResult};
use crate::identity::CallerIdentity;
use crate::pagination::PageQuery;
use crate::AppState;

use super::PagedResponse;

fn require_admin(caller: &CallerIdentity) -> Result<(), ApiError> {
    if !caller.role.is_admin() {
        return Err(ApiError::Forbidden(
            "only an admin can manage user accounts".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = users::register(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PagedResponse<User>>> {
    require_admin(&caller)?;
    let (page, limit, offset) = query.window();
    let (data, total) = users::list(&state.db, query.search_text(), limit, offset).await?;
    Ok(Json(PagedResponse::new(data, total, page, limit)))
}

/// PATCH /api/users/:id/status
///
/// Toggles the account between active and suspended.
pub async fn toggle_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<User>> {
    require_admin(&caller)?;
    let user = users::toggle_status(&state.db, &guid).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "update",
        "User",
        format!(
            "Set user {} status to {}",
            user.name,
            if user.status == 1 { "active" } else { "inactive" }
        ),
    )
    .await;
    Ok(Json(user))
}

/// DELETE /api/users/:id
pub async fn remove(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(guid): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;
    users::soft_delete(&state.db, &guid).await?;
    logs::append(
        &state.db,
        &caller.user_guid,
        "delete",
        "User",
        format!("Deleted user {}", guid),
    )
    .await;
    Ok(Json(serde_json::json!({ "message": "user deleted" })))
}
