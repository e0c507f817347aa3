//! Pagination utilities for list endpoints

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not supply `limit`
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound on caller-supplied page sizes
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters shared by all paged list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub search: Option<String>,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Rows per page
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PageQuery {
    /// Sanitized page/limit/offset; page and limit are clamped to valid
    /// bounds rather than rejected.
    pub fn window(&self) -> (i64, i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;
        (page, limit, offset)
    }

    /// Search text, trimmed; `None` when absent or blank
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Pagination metadata echoed back with every paged response
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub total_data: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(total_data: i64, page: i64, limit: i64) -> PageInfo {
        let total_pages = (total_data + limit - 1) / limit;
        PageInfo {
            total_data,
            page,
            limit,
            total_pages,
        }
    }
}
