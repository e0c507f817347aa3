//! pandu-admin library - membership administration service
//!
//! HTTP surface over the rank-progression and award engines plus the
//! scoped member/institution/user record queries. Caller identity arrives
//! from the upstream session layer as request headers; see [`identity`].

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod awards;
pub mod db;
pub mod error;
pub mod identity;
pub mod numbering;
pub mod pagination;
pub mod progression;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// Every `/api` route expects the caller-identity headers; `/health` is
/// public.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, patch, post};

    let api = Router::new()
        // Rank progression
        .route("/api/progression", get(api::progression::list))
        .route("/api/progression/summary", get(api::progression::summary))
        .route("/api/progression/tier1", post(api::progression::issue_tier1))
        .route("/api/progression/:id", get(api::progression::get))
        .route("/api/progression/:id/tier2", post(api::progression::issue_tier2))
        .route("/api/progression/:id/tier3", post(api::progression::issue_tier3))
        .route("/api/progression/:id/tier/:tier", delete(api::progression::revert))
        // Proficiency badges
        .route("/api/badges", get(api::badges::list).post(api::badges::award))
        .route("/api/badges/:id", get(api::badges::get).delete(api::badges::revoke))
        .route(
            "/api/badge-types",
            get(api::badge_types::list).post(api::badge_types::create),
        )
        .route(
            "/api/badge-types/:id",
            get(api::badge_types::get)
                .patch(api::badge_types::update)
                .delete(api::badge_types::remove),
        )
        // Garuda top honor
        .route("/api/garuda", get(api::garuda::list).post(api::garuda::request))
        .route("/api/garuda/summary", get(api::garuda::summary))
        .route("/api/garuda/:id", get(api::garuda::get).delete(api::garuda::remove))
        .route("/api/garuda/:id/approve", patch(api::garuda::approve))
        // Records
        .route("/api/members", get(api::members::list).post(api::members::create))
        .route(
            "/api/members/:id",
            get(api::members::get)
                .patch(api::members::update)
                .delete(api::members::remove),
        )
        .route(
            "/api/institutions",
            get(api::institutions::list).post(api::institutions::create),
        )
        .route(
            "/api/institutions/:id",
            get(api::institutions::get)
                .patch(api::institutions::update)
                .delete(api::institutions::remove),
        )
        // Accounts
        .route("/api/users/register", post(api::users::register))
        .route("/api/users", get(api::users::list))
        .route("/api/users/:id/status", patch(api::users::toggle_status))
        .route("/api/users/:id", delete(api::users::remove))
        // Dashboard
        .route("/api/dashboard", get(api::dashboard::dashboard));

    Router::new()
        .merge(api)
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
