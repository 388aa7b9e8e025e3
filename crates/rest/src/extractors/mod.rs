//! Axum extractors for the plates API.
//!
//! - [`EntityBody`] - Deserialize an entity from the request body
//! - [`PageQuery`] - Extract pagination, sort, eager-load and query parameters

mod entity_body;
mod page_query;

pub use entity_body::EntityBody;
pub use page_query::PageQuery;
