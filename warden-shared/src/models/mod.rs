/// Data models for Warden
///
/// # Models
///
/// - `user`: Credential records and role tags
/// - `document`: Documents, the owned resource guarded by ownership checks
/// - [`Pagination`] / [`Paginated`]: Page parameters and list envelopes

pub mod document;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Largest page size accepted by list operations
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page parameters (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Pagination {
    /// Validates page bounds
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `page` is zero or `limit` is outside `1..=100`.
    pub fn new(page: u32, limit: u32) -> Result<Self, AuthError> {
        if page == 0 {
            return Err(AuthError::InvalidInput("Page must be greater than 0".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AuthError::InvalidInput(format!(
                "Limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(Self { page, limit })
    }

    /// Number of rows to skip
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// Pagination metadata returned with every list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    /// Computes metadata for `total` rows under `pagination`
    pub fn new(pagination: Pagination, total: i64) -> Self {
        let limit = i64::from(pagination.limit.max(1));
        let total_pages = (total + limit - 1) / limit;

        Self {
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
            has_next_page: i64::from(pagination.page) * limit < total,
            has_previous_page: pagination.page > 1,
        }
    }
}

/// A page of items with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
