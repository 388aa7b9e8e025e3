//! Elasticsearch search index.
//!
//! Mirrors every entity into Elasticsearch for free-text search. The primary
//! store stays authoritative; this index only ever receives documents that
//! were already saved there.
//!
//! # Index Structure
//!
//! Each entity type gets its own index, `{prefix}_{entity}` (e.g.
//! `plates_platehistory`). The document id is the entity id and the document
//! body is the entity's JSON form, so search hits deserialize straight back
//! into entities. Mappings are derived from the entity descriptors: text
//! fields carry a `keyword` sub-field for sorting.
//!
//! Queries use the `query_string` syntax, passed through unmodified.
//!
//! # Example
//!
//! ```ignore
//! use plates_persistence::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchIndex};
//!
//! let config = ElasticsearchConfig {
//!     nodes: vec!["http://localhost:9200".to_string()],
//!     ..Default::default()
//! };
//! let index = ElasticsearchIndex::new(config)?;
//! index.initialize().await?;
//! ```

mod backend;
mod index;
mod schema;

pub use backend::{ElasticsearchAuth, ElasticsearchConfig, ElasticsearchIndex};
pub use schema::create_index_mapping;
