//! Paging, sorting and result types shared by every search.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Requested page window. Both fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// Page index, 0-based (default: 0).
    pub page: Option<i64>,

    /// Page size (default: [`QueryOptions::default_page_size`]).
    pub size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }
}

/// Caller-supplied ordering, as loose strings.
///
/// Resolution against the entity's allow-list happens in [`super::sort`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl SortSpec {
    pub fn new(sort_by: impl Into<String>, sort_direction: impl Into<String>) -> Self {
        Self {
            sort_by: Some(sort_by.into()),
            sort_direction: Some(sort_direction.into()),
        }
    }

    /// Ascending on the given field.
    pub fn by(sort_by: impl Into<String>) -> Self {
        Self {
            sort_by: Some(sort_by.into()),
            sort_direction: None,
        }
    }
}

/// One page of results plus totals computed without the page window.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,

    /// Page index (0-based).
    pub page: i64,

    /// Page size actually applied.
    pub size: i64,

    /// Rows matching the predicates, ignoring paging and eager loading.
    pub total_elements: i64,

    /// `ceil(total_elements / size)`, 0 when nothing matched.
    pub total_pages: i64,

    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Create a page with paging calculations.
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 && total_elements > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };

        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            has_next: page + 1 < total_pages,
            has_prev: page > 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Paging limits applied by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Size used when a request does not specify one.
    pub default_page_size: i64,

    /// Larger requested sizes are capped to this.
    pub max_page_size: i64,
}

/// Maximum items per page, regardless of what the caller asks for.
pub const MAX_ITEMS_PER_PAGE: i64 = 100;

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: MAX_ITEMS_PER_PAGE,
        }
    }
}

impl From<&Config> for QueryOptions {
    fn from(config: &Config) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}
