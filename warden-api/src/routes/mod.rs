/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and password flows
/// - `users`: User administration and self-service profile
/// - `documents`: Owned documents

pub mod auth;
pub mod documents;
pub mod health;
pub mod users;

use serde::Deserialize;
use warden_shared::models::Pagination;

use crate::error::ApiResult;

/// `?page=&limit=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Validated pagination, defaulting to page 1 of 10
    pub fn pagination(&self) -> ApiResult<Pagination> {
        let defaults = Pagination::default();
        Ok(Pagination::new(
            self.page.unwrap_or(defaults.page),
            self.limit.unwrap_or(defaults.limit),
        )?)
    }
}
