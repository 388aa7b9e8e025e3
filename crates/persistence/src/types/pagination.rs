//! Offset pagination and sorting.

use serde::{Deserialize, Serialize};

/// Direction of a sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Returns the lowercase name used by search engines.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A sort order on one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    /// JSON property name.
    pub property: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Ascending order on `property`.
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on `property`.
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses a `property[,asc|desc]` sort parameter.
    ///
    /// The direction is case-insensitive and defaults to ascending. Anything
    /// after the second comma is ignored.
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default().to_string();
        let direction = match parts.next() {
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Self {
            property,
            direction,
        }
    }
}

/// A request for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u64,
    /// Page size.
    pub size: u64,
    /// Sort orders, applied in sequence.
    pub sort: Vec<SortOrder>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: Vec::new(),
        }
    }
}

impl PageRequest {
    /// Creates an unsorted page request.
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Appends a sort order.
    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    /// Returns the number of rows to skip.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Zero-based page number.
    pub page: u64,
    /// Requested page size.
    pub size: u64,
}

impl<T> Page<T> {
    /// Creates a page for `request`.
    pub fn new(content: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            content,
            total,
            page: request.page,
            size: request.size,
        }
    }

    /// Returns the number of pages, at least one.
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total.div_ceil(self.size).max(1)
    }

    /// Returns true if a later page exists.
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    /// Returns true if an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Converts every item.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }

    /// Converts every item, stopping at the first error.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
            size: self.size,
        })
    }
}
