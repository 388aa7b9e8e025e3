//! Read-through caching wrapper around a primary store.

use std::collections::HashMap;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::{BackendKind, PrimaryStore};
use crate::domain::{EntityDescriptor, EntityId, descriptors};
use crate::error::StorageResult;
use crate::types::{Page, PageRequest};

use super::CacheConfig;

/// A [`PrimaryStore`] that caches single-entity reads.
///
/// Each entity type gets its own cache sized and expired by its
/// [`CachePolicy`](super::CachePolicy). Only `find_one` reads through the
/// cache. Saves replace the cached entry with the stored document. Deletes
/// evict the entry and clear the caches of every type that references the
/// deleted type, since their cached documents may point at the removed row.
pub struct CachedStore<S> {
    inner: S,
    caches: HashMap<&'static str, Cache<EntityId, Value>>,
}

impl<S: PrimaryStore> CachedStore<S> {
    /// Wraps a store.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let caches = descriptors()
            .into_iter()
            .map(|entity| {
                let policy = config.policy_for(entity.name);
                let cache = Cache::builder()
                    .max_capacity(policy.max_entries)
                    .time_to_live(policy.ttl)
                    .build();
                (entity.name, cache)
            })
            .collect();
        Self { inner, caches }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn cache(&self, entity: &EntityDescriptor) -> Option<&Cache<EntityId, Value>> {
        self.caches.get(entity.name)
    }

    /// Drops every cached entry of every type.
    pub fn invalidate_all(&self) {
        for cache in self.caches.values() {
            cache.invalidate_all();
        }
    }
}

#[async_trait]
impl<S: PrimaryStore> PrimaryStore for CachedStore<S> {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn save(
        &self,
        entity: &'static EntityDescriptor,
        document: Value,
    ) -> StorageResult<Value> {
        let saved = self.inner.save(entity, document).await?;
        if let (Some(cache), Some(id)) = (self.cache(entity), saved["id"].as_i64()) {
            cache.insert(id, saved.clone()).await;
        }
        Ok(saved)
    }

    #[instrument(skip(self, entity), fields(entity = entity.name))]
    async fn find_one(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
    ) -> StorageResult<Option<Value>> {
        let Some(cache) = self.cache(entity) else {
            return self.inner.find_one(entity, id).await;
        };
        if let Some(document) = cache.get(&id).await {
            debug!(id, "Cache hit");
            return Ok(Some(document));
        }

        let found = self.inner.find_one(entity, id).await?;
        if let Some(document) = &found {
            cache.insert(id, document.clone()).await;
        }
        Ok(found)
    }

    async fn find_all(&self, entity: &'static EntityDescriptor) -> StorageResult<Vec<Value>> {
        self.inner.find_all(entity).await
    }

    async fn find_page(
        &self,
        entity: &'static EntityDescriptor,
        page: &PageRequest,
        eager: bool,
    ) -> StorageResult<Page<Value>> {
        self.inner.find_page(entity, page, eager).await
    }

    async fn delete(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
    ) -> StorageResult<bool> {
        let existed = self.inner.delete(entity, id).await?;
        if let Some(cache) = self.cache(entity) {
            cache.invalidate(&id).await;
        }
        for other in descriptors() {
            if other.references(entity.table) {
                if let Some(cache) = self.cache(other) {
                    cache.invalidate_all();
                }
            }
        }
        Ok(existed)
    }

    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64> {
        self.inner.count(entity).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, Note, Plate, Region};
    use crate::error::{ResourceError, StorageError};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal store counting `find_one` calls.
    #[derive(Default)]
    struct CountingStore {
        rows: Mutex<BTreeMap<(&'static str, EntityId), Value>>,
        next_id: AtomicUsize,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl PrimaryStore for CountingStore {
        fn kind(&self) -> BackendKind {
            BackendKind::Custom("counting")
        }

        async fn save(
            &self,
            entity: &'static EntityDescriptor,
            mut document: Value,
        ) -> StorageResult<Value> {
            let id = match document["id"].as_i64() {
                Some(id) => {
                    if !self.rows.lock().contains_key(&(entity.name, id)) {
                        return Err(StorageError::Resource(ResourceError::NotFound {
                            entity: entity.name.to_string(),
                            id,
                        }));
                    }
                    id
                }
                None => self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
            };
            document["id"] = json!(id);
            self.rows.lock().insert((entity.name, id), document.clone());
            Ok(document)
        }

        async fn find_one(
            &self,
            entity: &'static EntityDescriptor,
            id: EntityId,
        ) -> StorageResult<Option<Value>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().get(&(entity.name, id)).cloned())
        }

        async fn find_all(&self, _entity: &'static EntityDescriptor) -> StorageResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn find_page(
            &self,
            _entity: &'static EntityDescriptor,
            page: &PageRequest,
            _eager: bool,
        ) -> StorageResult<Page<Value>> {
            Ok(Page::new(Vec::new(), 0, page))
        }

        async fn delete(
            &self,
            entity: &'static EntityDescriptor,
            id: EntityId,
        ) -> StorageResult<bool> {
            Ok(self.rows.lock().remove(&(entity.name, id)).is_some())
        }

        async fn count(&self, _entity: &'static EntityDescriptor) -> StorageResult<u64> {
            Ok(self.rows.lock().len() as u64)
        }

        async fn health_check(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn reads(store: &CachedStore<CountingStore>) -> usize {
        store.inner().reads.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_second_read_served_from_cache() {
        let store = CachedStore::new(CountingStore::default(), &CacheConfig::default());
        store
            .inner()
            .rows
            .lock()
            .insert(("region", 1), json!({"id": 1, "regionName": "EU"}));

        let first = store.find_one(Region::descriptor(), 1).await.unwrap();
        let second = store.find_one(Region::descriptor(), 1).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(reads(&store), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let store = CachedStore::new(CountingStore::default(), &CacheConfig::default());
        assert!(store.find_one(Region::descriptor(), 9).await.unwrap().is_none());
        assert!(store.find_one(Region::descriptor(), 9).await.unwrap().is_none());
        assert_eq!(reads(&store), 2);
    }

    #[tokio::test]
    async fn test_save_refreshes_entry() {
        let store = CachedStore::new(CountingStore::default(), &CacheConfig::default());
        let saved = store
            .save(Note::descriptor(), json!({"title": "a"}))
            .await
            .unwrap();
        let id = saved["id"].as_i64().unwrap();

        store
            .save(Note::descriptor(), json!({"id": id, "title": "b"}))
            .await
            .unwrap();
        let found = store.find_one(Note::descriptor(), id).await.unwrap().unwrap();
        assert_eq!(found["title"], "b");
        assert_eq!(reads(&store), 0);
    }

    #[tokio::test]
    async fn test_delete_invalidates_entry_and_referencing_types() {
        let store = CachedStore::new(CountingStore::default(), &CacheConfig::default());
        let note = store
            .save(Note::descriptor(), json!({"title": "a"}))
            .await
            .unwrap();
        let note_id = note["id"].as_i64().unwrap();
        let plate = store
            .save(
                Plate::descriptor(),
                json!({"plateTitle": "p", "notes": [{"id": note_id}]}),
            )
            .await
            .unwrap();
        let plate_id = plate["id"].as_i64().unwrap();

        assert!(store.delete(Note::descriptor(), note_id).await.unwrap());
        assert!(store.find_one(Note::descriptor(), note_id).await.unwrap().is_none());

        // The plate entry was dropped, so the next read reaches the store.
        store.find_one(Plate::descriptor(), plate_id).await.unwrap();
        assert_eq!(reads(&store), 2);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let config = CacheConfig::new(std::time::Duration::from_millis(50), 10);
        let store = CachedStore::new(CountingStore::default(), &config);
        store
            .inner()
            .rows
            .lock()
            .insert(("region", 1), json!({"id": 1}));

        store.find_one(Region::descriptor(), 1).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        store.find_one(Region::descriptor(), 1).await.unwrap();
        assert_eq!(reads(&store), 2);
    }
}
