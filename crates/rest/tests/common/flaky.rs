//! A search index that fails on demand.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use plates_persistence::backends::memory::MemoryIndex;
use plates_persistence::core::{BackendKind, SearchIndex};
use plates_persistence::domain::{EntityDescriptor, EntityId};
use plates_persistence::error::{BackendError, StorageError, StorageResult};
use plates_persistence::{Page, PageRequest};

/// Delegates to a [`MemoryIndex`] unless switched to failing.
#[derive(Default)]
pub struct FlakyIndex {
    inner: MemoryIndex,
    failing: AtomicBool,
}

impl FlakyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "flaky".to_string(),
                message: "index is failing on purpose".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for FlakyIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom("flaky")
    }

    async fn index(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
        document: &Value,
    ) -> StorageResult<()> {
        self.check()?;
        self.inner.index(entity, id, document).await
    }

    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId) -> StorageResult<()> {
        self.check()?;
        self.inner.delete(entity, id).await
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
