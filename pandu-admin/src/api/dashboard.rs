//! Dashboard summary API

use axum::{extract::State, Json};
use pandu_common::db::models::ActivityLogEntry;
use serde::Serialize;

use crate::db::{badges, institutions, logs, members, progressions};
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::AppState;

/// Scoped record counts plus recent activity
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_members: i64,
    pub total_institutions: i64,
    pub total_progressions: i64,
    pub total_badges: i64,
    pub recent_activity: Vec<ActivityLogEntry>,
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Json<DashboardResponse>> {
    let scope = caller.scope();

    Ok(Json(DashboardResponse {
        total_members: members::count(&state.db, &scope).await?,
        total_institutions: institutions::count(&state.db, &scope).await?,
        total_progressions: progressions::count(&state.db, &scope).await?,
        total_badges: badges::count(&state.db, &scope).await?,
        recent_activity: logs::recent(&state.db, 10).await?,
    }))
}
