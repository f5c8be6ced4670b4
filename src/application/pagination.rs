//! Offset pagination helpers.

use catalog_api_types::{PageResponse, PaginationMeta};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Page of results together with its pagination metadata.
pub type Page<T> = PageResponse<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(i64),
    #[error("page_size must be between 1 and {max}, got {value}")]
    InvalidPageSize { value: i64, max: u32 },
}

impl PaginationError {
    pub fn field(&self) -> &'static str {
        match self {
            PaginationError::InvalidPage(_) => "page",
            PaginationError::InvalidPageSize { .. } => "page_size",
        }
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(
        page: Option<i64>,
        page_size: Option<i64>,
        limits: PageLimits,
    ) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(1);
        if page < 1 || page > i64::from(u32::MAX) {
            return Err(PaginationError::InvalidPage(page));
        }

        let page_size = page_size.unwrap_or(i64::from(limits.default_page_size));
        if page_size < 1 || page_size > i64::from(limits.max_page_size) {
            return Err(PaginationError::InvalidPageSize {
                value: page_size,
                max: limits.max_page_size,
            });
        }

        Ok(Self {
            page: page as u32,
            page_size: page_size as u32,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn into_page<T>(self, items: Vec<T>, total_items: u64) -> Page<T> {
        PageResponse::new(
            items,
            PaginationMeta::new(self.page, self.page_size, total_items),
        )
    }
}
