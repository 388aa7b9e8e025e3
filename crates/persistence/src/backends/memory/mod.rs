//! In-memory search index.
//!
//! Used when no Elasticsearch cluster is configured and in tests. Supports a
//! subset of the Lucene query-string syntax; see [`query`].

mod index;
pub mod query;

pub use index::MemoryIndex;
