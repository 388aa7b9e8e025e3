//! Search index trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::BackendKind;
use crate::domain::{EntityDescriptor, EntityId};
use crate::error::StorageResult;
use crate::types::{Page, PageRequest};

/// A secondary, text-searchable mirror of the primary store.
///
/// One collection per entity type, keyed by entity id. The index never
/// assigns ids; callers index documents the primary store has already
/// saved.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this index.
    fn backend_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Creates or replaces the document with the given id.
    async fn index(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
        document: &Value,
    ) -> StorageResult<()>;

    /// Removes a document. Removing a missing document succeeds.
    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId) -> StorageResult<()>;

    /// Runs a free-text query. The query string is passed to the engine
    /// unmodified.
    ///
    /// # Errors
    ///
    /// * `StorageError::Search(QueryParseError)` - the engine rejected the query
    /// * `StorageError::Search(ResultWindowExceeded)` - the page lies beyond
    ///   what the engine can serve
    async fn search(
        &self,
        entity: &'static EntityDescriptor,
        query: &str,
        page: &PageRequest,
    ) -> StorageResult<Page<Value>>;

    /// Removes every document of a type.
    async fn clear(&self, entity: &'static EntityDescriptor) -> StorageResult<()>;

    /// Counts documents of a type.
    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64>;

    /// Makes recent writes visible to search. A no-op for indexes that are
    /// always consistent.
    async fn refresh(&self, _entity: &'static EntityDescriptor) -> StorageResult<()> {
        Ok(())
    }

    /// Checks that the index is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}
