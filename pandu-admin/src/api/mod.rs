//! HTTP API handlers for pandu-admin

pub mod badge_types;
pub mod badges;
pub mod dashboard;
pub mod garuda;
pub mod health;
pub mod institutions;
pub mod members;
pub mod progression;
pub mod users;

use serde::Serialize;

use crate::pagination::PageInfo;

/// Envelope for every paged list response
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> PagedResponse<T> {
        PagedResponse {
            data,
            pagination: PageInfo::new(total, page, limit),
        }
    }
}
