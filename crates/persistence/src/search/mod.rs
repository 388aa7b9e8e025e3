//! Search index maintenance.
//!
//! Free-text queries themselves go through
//! [`SearchIndex::search`](crate::core::SearchIndex::search); this module
//! holds the operations that rebuild index contents.

pub mod reindex;

pub use reindex::{
    EntityReindexResult, ReindexItemError, ReindexReport, ReindexRequest, ReindexStatus, Reindexer,
};
