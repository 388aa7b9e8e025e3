//! Pagination extractor.
//!
//! Extracts `page`, `size`, repeatable `sort`, `eagerload` and `query`
//! parameters from the query string.

use axum::{extract::FromRequestParts, http::request::Parts};
use plates_persistence::{PageRequest, SortOrder};

use crate::error::RestError;
use crate::state::AppState;

/// Axum extractor for list and search parameters.
///
/// `page` is zero-based. A `size` below 1 falls back to the configured
/// default and a `size` above the configured maximum is capped. `sort` may
/// be repeated, each value being `property[,asc|desc]`.
///
/// # Example
///
/// ```rust,ignore
/// use plates_rest::extractors::PageQuery;
///
/// async fn list_handler(params: PageQuery) {
///     let page = params.page_request();
///     let eager = params.eagerload();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PageQuery {
    page: PageRequest,
    eagerload: bool,
    query: Option<String>,
}

impl PageQuery {
    /// Parses a raw query string.
    ///
    /// # Errors
    ///
    /// Returns a 400 error for non-numeric `page`/`size` or a non-boolean
    /// `eagerload`. The error carries no entity name.
    pub fn parse(raw: Option<&str>, default_size: u64, max_size: u64) -> Result<Self, RestError> {
        let mut page: i64 = 0;
        let mut size: Option<i64> = None;
        let mut sort = Vec::new();
        let mut eagerload = false;
        let mut query = None;

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "page" => page = parse_number("page", &value)?,
                "size" => size = Some(parse_number("size", &value)?),
                "sort" if !value.trim().is_empty() => sort.push(SortOrder::parse(&value)),
                "eagerload" => eagerload = parse_flag("eagerload", &value)?,
                "query" => query = Some(value.into_owned()),
                _ => {}
            }
        }

        let size = match size {
            Some(s) if s >= 1 => (s as u64).min(max_size),
            _ => default_size,
        };
        let mut request = PageRequest::new(page.max(0) as u64, size);
        request.sort = sort;

        Ok(Self {
            page: request,
            eagerload,
            query,
        })
    }

    /// Returns the page request.
    pub fn page_request(&self) -> &PageRequest {
        &self.page
    }

    /// Returns whether owned collections should be loaded.
    pub fn eagerload(&self) -> bool {
        self.eagerload
    }

    /// Returns the raw search query, if given.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

fn parse_number(name: &str, value: &str) -> Result<i64, RestError> {
    value.trim().parse().map_err(|_| {
        RestError::bad_request(
            "",
            "invalidparam",
            format!("Parameter '{}' must be an integer, got '{}'", name, value),
        )
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, RestError> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(RestError::bad_request(
            "",
            "invalidparam",
            format!("Parameter '{}' must be true or false, got '{}'", name, value),
        )),
    }
}

impl FromRequestParts<AppState> for PageQuery {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        PageQuery::parse(
            parts.uri.query(),
            state.default_page_size(),
            state.max_page_size(),
        )
    }
}
