//! Primary store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::BackendKind;
use crate::domain::{EntityDescriptor, EntityId};
use crate::error::StorageResult;
use crate::types::{Page, PageRequest};

/// The authoritative relational store.
///
/// Documents are camelCase JSON objects as produced by serializing an
/// entity. References are `{"id": n}` objects and owned many-to-many
/// collections are arrays of them.
///
/// # Example
///
/// ```ignore
/// use plates_persistence::core::PrimaryStore;
/// use plates_persistence::domain::{Entity, Plate};
///
/// async fn example<S: PrimaryStore>(store: &S) -> StorageResult<()> {
///     let saved = store
///         .save(Plate::descriptor(), serde_json::json!({"plateTitle": "A"}))
///         .await?;
///     let id = saved["id"].as_i64().unwrap();
///     assert!(store.find_one(Plate::descriptor(), id).await?.is_some());
///     store.delete(Plate::descriptor(), id).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this store.
    fn backend_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Inserts the document if it has no id, otherwise updates the row with
    /// that id. Returns the stored document re-read from the store, with the
    /// id populated and owned collections loaded.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - update of an id with no row
    /// * `StorageError::Validation` - missing required field, malformed
    ///   value, or a constraint violation
    async fn save(&self, entity: &'static EntityDescriptor, document: Value)
    -> StorageResult<Value>;

    /// Reads one document with owned collections loaded.
    async fn find_one(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
    ) -> StorageResult<Option<Value>>;

    /// Reads every document of a type ordered by id, collections loaded.
    async fn find_all(&self, entity: &'static EntityDescriptor) -> StorageResult<Vec<Value>>;

    /// Reads one page. Owned collections are loaded only when `eager` is
    /// set; otherwise they are omitted from the documents.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation(InvalidSortProperty)` - unknown sort property
    async fn find_page(
        &self,
        entity: &'static EntityDescriptor,
        page: &PageRequest,
        eager: bool,
    ) -> StorageResult<Page<Value>>;

    /// Deletes a row. Returns whether a row existed.
    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId)
    -> StorageResult<bool>;

    /// Counts rows of a type.
    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}
