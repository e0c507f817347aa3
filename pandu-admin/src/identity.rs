//! Caller identity extraction
//!
//! Authentication itself happens upstream (the session layer terminates in
//! front of this service); the authenticated identity arrives as trusted
//! request headers. This module turns those headers into a typed
//! `CallerIdentity` and the derived `AccessScope`.

use axum::{extract::FromRequestParts, http::request::Parts};
use pandu_common::scope::{AccessScope, Role};

use crate::error::ApiError;

/// Header carrying the caller's role (`user`, `admin`, `super_admin`)
pub const ROLE_HEADER: &str = "x-caller-role";
/// Header carrying the caller's user guid
pub const CALLER_HEADER: &str = "x-caller-id";
/// Header carrying the caller's institution guid, when affiliated
pub const INSTITUTION_HEADER: &str = "x-caller-institution";
/// Header carrying the caller's display name (used for approval records)
pub const NAME_HEADER: &str = "x-caller-name";

/// Authenticated caller, as asserted by the upstream session layer
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_guid: String,
    pub name: String,
    pub role: Role,
    pub institution_guid: Option<String>,
}

impl CallerIdentity {
    /// Record-visibility scope for this caller
    pub fn scope(&self) -> AccessScope {
        AccessScope::resolve(self.role, self.institution_guid.as_deref())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| -> Option<String> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
                .filter(|v| !v.is_empty())
        };

        let role_str = header(ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing caller role".to_string()))?;
        let role = Role::parse(&role_str)
            .ok_or_else(|| ApiError::Unauthorized(format!("unknown role: {}", role_str)))?;

        let user_guid = header(CALLER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing caller id".to_string()))?;

        Ok(CallerIdentity {
            user_guid,
            name: header(NAME_HEADER).unwrap_or_default(),
            role,
            institution_guid: header(INSTITUTION_HEADER),
        })
    }
}
