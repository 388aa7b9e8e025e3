//! Generic entity service orchestrating the dual write.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::{PrimaryStore, SearchIndex};
use crate::domain::{Entity, EntityId};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{Page, PageRequest};

use super::health::SyncMonitor;
use super::sync::{DivergenceRecord, SyncOperation};

/// CRUD and search for one entity type.
///
/// Writes go to the primary store first. The document the store returns,
/// with its id assigned, is then written to the search index. A failure of
/// the index write does not fail the operation: it is logged, recorded in
/// the [`SyncMonitor`] and left for a reindex to repair. Reads other than
/// [`search`](Self::search) are served by the primary store.
pub struct EntityService<E> {
    store: Arc<dyn PrimaryStore>,
    index: Arc<dyn SearchIndex>,
    monitor: Arc<SyncMonitor>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: Arc::clone(&self.index),
            monitor: Arc::clone(&self.monitor),
            _entity: PhantomData,
        }
    }
}

fn decode<E: Entity>(document: Value) -> StorageResult<E> {
    Ok(serde_json::from_value(document)?)
}

impl<E: Entity> EntityService<E> {
    /// Creates a service over shared backends.
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        index: Arc<dyn SearchIndex>,
        monitor: Arc<SyncMonitor>,
    ) -> Self {
        Self {
            store,
            index,
            monitor,
            _entity: PhantomData,
        }
    }

    /// Inserts (no id) or updates (id set) an entity and mirrors it into the
    /// index. Returns the stored entity.
    ///
    /// # Errors
    ///
    /// Only primary store failures are returned. The index is not touched
    /// when the primary write fails.
    #[instrument(skip(self, entity), fields(entity = E::descriptor().name, id = ?entity.id()))]
    pub async fn save(&self, entity: E) -> StorageResult<E> {
        let descriptor = E::descriptor();
        let document = serde_json::to_value(&entity)?;
        let saved = self.store.save(descriptor, document).await?;

        let id = saved["id"].as_i64().ok_or_else(|| {
            StorageError::Backend(BackendError::Internal {
                backend_name: self.store.backend_name().to_string(),
                message: "stored document has no id".to_string(),
                source: None,
            })
        })?;

        match self.index.index(descriptor, id, &saved).await {
            Ok(()) => {
                self.monitor.record_success(self.index.backend_name());
                self.monitor.resolve_divergence(descriptor.name, id);
                debug!(id, "Saved and indexed");
            }
            Err(e) => self.diverged(id, SyncOperation::Index, e),
        }

        decode(saved)
    }

    /// Returns every entity, collections loaded.
    pub async fn find_all(&self) -> StorageResult<Vec<E>> {
        self.store
            .find_all(E::descriptor())
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Returns one page. Owned collections are loaded only when `eager` is set.
    #[instrument(skip(self, page), fields(entity = E::descriptor().name, page = page.page, size = page.size))]
    pub async fn find_all_paged(&self, page: &PageRequest, eager: bool) -> StorageResult<Page<E>> {
        self.store
            .find_page(E::descriptor(), page, eager)
            .await?
            .try_map(decode)
    }

    /// Returns the entity with the given id, collections loaded.
    pub async fn find_one(&self, id: EntityId) -> StorageResult<Option<E>> {
        self.store
            .find_one(E::descriptor(), id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Deletes from the primary store, then from the index. Deleting a
    /// missing id succeeds.
    #[instrument(skip(self), fields(entity = E::descriptor().name))]
    pub async fn delete(&self, id: EntityId) -> StorageResult<()> {
        let descriptor = E::descriptor();
        let existed = self.store.delete(descriptor, id).await?;

        match self.index.delete(descriptor, id).await {
            Ok(()) => {
                self.monitor.record_success(self.index.backend_name());
                self.monitor.resolve_divergence(descriptor.name, id);
                debug!(id, existed, "Deleted");
            }
            Err(e) => self.diverged(id, SyncOperation::Delete, e),
        }
        Ok(())
    }

    /// Runs a free-text query against the index. The query is passed through
    /// unmodified.
    #[instrument(skip(self, page), fields(entity = E::descriptor().name, page = page.page, size = page.size))]
    pub async fn search(&self, query: &str, page: &PageRequest) -> StorageResult<Page<E>> {
        let result = self.index.search(E::descriptor(), query, page).await;
        match &result {
            Ok(_) => self.monitor.record_success(self.index.backend_name()),
            Err(e) if !e.is_client_error() => self
                .monitor
                .record_failure(self.index.backend_name(), e.to_string()),
            Err(_) => {}
        }
        result?.try_map(decode)
    }

    /// Counts rows in the primary store.
    pub async fn count(&self) -> StorageResult<u64> {
        self.store.count(E::descriptor()).await
    }

    fn diverged(&self, id: EntityId, operation: SyncOperation, error: StorageError) {
        let entity = E::descriptor().name;
        warn!(
            entity,
            id,
            operation = %operation,
            error = %error,
            "Failed to sync search index, stores have diverged"
        );
        self.monitor
            .record_failure(self.index.backend_name(), error.to_string());
        self.monitor
            .record_divergence(DivergenceRecord::new(entity, id, operation, error.to_string()));
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryIndex;
    use crate::backends::sqlite::SqliteBackend;
    use crate::domain::{Note, Plate};

    fn service<E: Entity>() -> (EntityService<E>, Arc<SqliteBackend>, Arc<MemoryIndex>) {
        let store = Arc::new(SqliteBackend::in_memory().unwrap());
        store.init_schema().unwrap();
        let index = Arc::new(MemoryIndex::new());
        let service = EntityService::new(
            store.clone() as Arc<dyn PrimaryStore>,
            index.clone() as Arc<dyn SearchIndex>,
            Arc::new(SyncMonitor::default()),
        );
        (service, store, index)
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_indexes() {
        let (service, _store, index) = service::<Note>();
        let saved = service
            .save(Note::new().with_title("Glaze").with_description("crackle"))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        assert_eq!(service.find_one(id).await.unwrap().unwrap(), saved);
        assert_eq!(index.count(Note::descriptor()).await.unwrap(), 1);

        let hits = service
            .search("crackle", &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(hits.content, vec![saved]);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (service, _store, index) = service::<Note>();
        let saved = service.save(Note::new().with_title("a")).await.unwrap();
        let id = saved.id.unwrap();

        service.delete(id).await.unwrap();
        service.delete(id).await.unwrap();
        assert_eq!(service.count().await.unwrap(), 0);
        assert_eq!(index.count(Note::descriptor()).await.unwrap(), 0);
        assert!(service.find_one(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_paged_lists_respect_eager_flag() {
        let (notes, store, index) = service::<Note>();
        let plates: EntityService<Plate> = EntityService::new(
            store as Arc<dyn PrimaryStore>,
            index as Arc<dyn SearchIndex>,
            Arc::new(SyncMonitor::default()),
        );
        let note = notes.save(Note::new().with_title("n")).await.unwrap();
        plates
            .save(Plate::new().with_plate_title("p").with_notes([note.id.unwrap()]))
            .await
            .unwrap();

        let lazy = plates
            .find_all_paged(&PageRequest::default(), false)
            .await
            .unwrap();
        assert!(lazy.content[0].notes.is_none());

        let eager = plates
            .find_all_paged(&PageRequest::default(), true)
            .await
            .unwrap();
        assert_eq!(eager.content[0].note_ids(), vec![note.id.unwrap()]);
    }
}
