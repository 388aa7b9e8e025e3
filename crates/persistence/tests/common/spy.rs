//! A search index that records writes.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use plates_persistence::backends::memory::MemoryIndex;
use plates_persistence::core::{BackendKind, SearchIndex};
use plates_persistence::domain::{EntityDescriptor, EntityId};
use plates_persistence::error::{BackendError, StorageError, StorageResult};
use plates_persistence::types::{Page, PageRequest};

/// A write that reached the spy.
#[derive(Debug, Clone, PartialEq)]
pub enum SpyWrite {
    Index {
        entity: &'static str,
        id: EntityId,
        document: Value,
    },
    Delete {
        entity: &'static str,
        id: EntityId,
    },
}

/// Delegates to a [`MemoryIndex`], recording every successful write. While
/// failing, writes and searches return a backend error and are not recorded.
#[derive(Default)]
pub struct SpyIndex {
    inner: MemoryIndex,
    writes: Mutex<Vec<SpyWrite>>,
    failing: AtomicBool,
}

impl SpyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<SpyWrite> {
        self.writes.lock().clone()
    }

    pub fn index_writes(&self, entity: &str) -> Vec<(EntityId, Value)> {
        self.writes
            .lock()
            .iter()
            .filter_map(|w| match w {
                SpyWrite::Index {
                    entity: e,
                    id,
                    document,
                } if *e == entity => Some((*id, document.clone())),
                _ => None,
            })
            .collect()
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "spy".to_string(),
                message: "index is failing on purpose".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for SpyIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom("spy")
    }

    async fn index(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
        document: &Value,
    ) -> StorageResult<()> {
        self.check()?;
        self.inner.index(entity, id, document).await?;
        self.writes.lock().push(SpyWrite::Index {
            entity: entity.name,
            id,
            document: document.clone(),
        });
        Ok(())
    }

    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId) -> StorageResult<()> {
        self.check()?;
        self.inner.delete(entity, id).await?;
        self.writes.lock().push(SpyWrite::Delete {
            entity: entity.name,
            id,
        });
        Ok(())
    }

    async fn search(
        &self,
        entity: &'static EntityDescriptor,
        query: &str,
        page: &PageRequest,
    ) -> StorageResult<Page<Value>> {
        self.check()?;
        self.inner.search(entity, query, page).await
    }

    async fn clear(&self, entity: &'static EntityDescriptor) -> StorageResult<()> {
        self.check()?;
        self.inner.clear(entity).await
    }

    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64> {
        self.inner.count(entity).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.check()
    }
}
