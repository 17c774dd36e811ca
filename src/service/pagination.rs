//! Page-based pagination
//!
//! Converts `(page, limit)` query parameters into a window over an
//! ordered scan and reports the metadata clients need to walk it.

use serde::Serialize;
use std::future::Future;

use crate::config::PaginationConfig;
use crate::error::AppError;

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Effective page size, already clamped
    pub limit: u64,
}

fn parse_positive(raw: Option<&str>, name: &str) -> Result<Option<u64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(Some(value)),
        _ => Err(AppError::Validation(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

impl PageRequest {
    /// Build from raw query values, applying configured defaults
    ///
    /// `limit` above the configured maximum is clamped, not rejected.
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self, AppError> {
        let page = parse_positive(page, "page")?.unwrap_or(1);
        let limit = parse_positive(limit, "limit")?
            .unwrap_or(u64::from(config.default_limit))
            .min(u64::from(config.max_limit));

        Ok(Self { page, limit })
    }

    /// Number of items before this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results plus navigation metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.limit);
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }

    /// Transform the items while keeping the metadata
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        Page {
            items: f(self.items),
            page: self.page,
            limit: self.limit,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Fetch one page given the total size of the ordered scan
///
/// Pages past the end produce no items and skip the fetch entirely.
pub async fn paginate<T, F, Fut>(
    request: PageRequest,
    total_items: u64,
    fetch: F,
) -> Result<Page<T>, AppError>
where
    F: FnOnce(u64, u64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, AppError>>,
{
    let offset = request.offset();
    let items = if offset >= total_items {
        Vec::new()
    } else {
        fetch(offset, request.limit).await?
    };

    Ok(Page::new(items, request, total_items))
}
