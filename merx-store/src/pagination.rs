//! Pagination normalization and SQL clause building
//!
//! Every list operation goes through here. Page and size are clamped against
//! configured bounds, the sort column is sanitized to `[A-Za-z0-9_]` before
//! it is ever interpolated into SQL, and the emitted clause always carries an
//! ORDER BY so result pages are deterministic.

use serde::{Deserialize, Serialize};

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Parse leniently: anything that is not DESC (case-insensitive) is ASC
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("DESC") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Request object for paginated queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 0-indexed page number
    pub page: i32,
    /// Page size; clamped by [`Paginator::normalize`]
    pub size: i32,
    /// Optional sort column; sanitized before use
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
}

impl PageRequest {
    pub fn new(page: i32, size: i32, sort_by: Option<String>, sort_direction: SortDirection) -> Self {
        Self {
            page,
            size,
            sort_by,
            sort_direction,
        }
    }

    /// Offset of the first row of this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort_by: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

/// One page of results with paging metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: i32,
    pub size: i32,
    pub total_elements: i64,
    pub total_pages: i32,
    pub first: bool,
    pub last: bool,
}

impl<T> PageResponse<T> {
    /// Map the content, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
        }
    }
}

/// Pagination bounds
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Size used when the request passes size <= 0
    pub default_page_size: i32,
    /// Upper clamp for the page size
    pub max_page_size: i32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Helper for normalizing requests and building SQL fragments
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Normalize a page request against the configured bounds:
    /// negative page -> 0, size <= 0 -> default, size > max -> max.
    pub fn normalize(&self, request: &PageRequest) -> PageRequest {
        let page = request.page.max(0);

        let size = if request.size <= 0 {
            self.config.default_page_size
        } else if request.size > self.config.max_page_size {
            self.config.max_page_size
        } else {
            request.size
        };

        PageRequest {
            page,
            size,
            sort_by: request.sort_by.clone(),
            sort_direction: request.sort_direction,
        }
    }

    /// Build the ` ORDER BY ... LIMIT ... OFFSET ...` fragment for a request.
    ///
    /// The sort column falls back to `id` so pages are deterministic even
    /// when the caller does not ask for an ordering. Only `[A-Za-z0-9_]`
    /// survives sanitization; a column that sanitizes to nothing also falls
    /// back to `id`.
    pub fn build_clause(&self, request: &PageRequest) -> String {
        let normalized = self.normalize(request);

        let column = normalized
            .sort_by
            .as_deref()
            .map(sanitize_sort_column)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "id".to_string());

        format!(
            " ORDER BY {} {} LIMIT {} OFFSET {}",
            column,
            normalized.sort_direction.as_sql(),
            normalized.size,
            normalized.offset()
        )
    }

    /// Assemble a page response from content and a total count
    pub fn build_page_response<T>(
        &self,
        content: Vec<T>,
        total_elements: i64,
        request: &PageRequest,
    ) -> PageResponse<T> {
        let normalized = self.normalize(request);
        let total_pages = if total_elements == 0 {
            0
        } else {
            ((total_elements + i64::from(normalized.size) - 1) / i64::from(normalized.size)) as i32
        };

        PageResponse {
            content,
            page: normalized.page,
            size: normalized.size,
            total_elements,
            total_pages,
            first: normalized.page == 0,
            last: normalized.page >= total_pages - 1,
        }
    }
}

/// Strip everything outside `[A-Za-z0-9_]` from a sort column
fn sanitize_sort_column(column: &str) -> String {
    column
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
