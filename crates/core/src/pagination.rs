//! Page/limit arithmetic for list endpoints.

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Pages past this are clamped; keeps `offset` well inside `i64`.
pub const MAX_PAGE: i64 = 1_000_000;

/// A clamped `page`/`limit` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamp raw query values using the standard default limit.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self::with_default_limit(page, limit, DEFAULT_LIMIT)
    }

    /// Clamp raw query values, falling back to `default_limit`.
    pub fn with_default_limit(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Number of pages needed to show `total` rows at `limit` per page.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
