//! Access-scope resolution
//!
//! A caller's role and institution affiliation determine which member,
//! progression, and award rows are visible or mutable. Institution-scoped
//! callers see only their own institution's members; admins and super-admins
//! see everything. Every list/aggregate query applies the resolved scope
//! before any other predicate.

use serde::{Deserialize, Serialize};

/// Caller roles, lowest to highest privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular institution-scoped account
    User,
    /// Cross-institution administrator
    Admin,
    /// Cross-institution administrator with approval authority
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Parse from the stored/transported string form
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "super_admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Admin and above may manage members, institutions, and user accounts
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

/// Record-visibility filter derived from the caller identity
///
/// Pure function of (role, institution); carries no connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Unrestricted (admin, super-admin, or unaffiliated account)
    All,
    /// Restricted to one institution's members
    Institution(String),
}

impl AccessScope {
    /// Resolve the scope for a caller
    ///
    /// Only the regular role with an institution affiliation is restricted;
    /// an unaffiliated regular account resolves to `All`, matching how the
    /// record filters were originally applied.
    pub fn resolve(role: Role, institution_guid: Option<&str>) -> AccessScope {
        match (role, institution_guid) {
            (Role::User, Some(guid)) if !guid.is_empty() => {
                AccessScope::Institution(guid.to_string())
            }
            _ => AccessScope::All,
        }
    }

    /// The institution restriction, if any
    pub fn institution(&self) -> Option<&str> {
        match self {
            AccessScope::All => None,
            AccessScope::Institution(guid) => Some(guid.as_str()),
        }
    }
}
