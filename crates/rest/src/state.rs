//! Application state for the plates REST API.
//!
//! This module defines the shared application state that is available to all
//! request handlers: the primary store, the search index, the sync monitor
//! and the configuration.

use std::sync::Arc;

use plates_persistence::domain::Entity;
use plates_persistence::{EntityService, PrimaryStore, Reindexer, SearchIndex, SyncMonitor};

use crate::config::ServerConfig;

/// Shared application state for the REST API.
///
/// Every handler builds its [`EntityService`] from the same backends, so a
/// write through one entity's endpoints is visible to every other.
///
/// # Example
///
/// ```rust,ignore
/// use plates_rest::{AppState, ServerConfig};
/// use plates_persistence::backends::memory::MemoryIndex;
/// use plates_persistence::backends::sqlite::SqliteBackend;
/// use std::sync::Arc;
///
/// let backend = SqliteBackend::in_memory()?;
/// backend.init_schema()?;
/// let state = AppState::new(Arc::new(backend), Arc::new(MemoryIndex::new()), ServerConfig::default());
/// ```
pub struct AppState {
    /// The primary store.
    store: Arc<dyn PrimaryStore>,

    /// The search index.
    index: Arc<dyn SearchIndex>,

    /// Backend health and divergence tracking.
    monitor: Arc<SyncMonitor>,

    /// Index rebuilder.
    reindexer: Arc<Reindexer>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since the trait objects are wrapped in Arc
impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: Arc::clone(&self.index),
            monitor: Arc::clone(&self.monitor),
            reindexer: Arc::clone(&self.reindexer),
            config: Arc::clone(&self.config),
        }
    }
}

impl AppState {
    /// Creates a new AppState with the given backends and configuration.
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        index: Arc<dyn SearchIndex>,
        config: ServerConfig,
    ) -> Self {
        let monitor = Arc::new(SyncMonitor::default());
        let reindexer = Arc::new(Reindexer::new(
            Arc::clone(&store),
            Arc::clone(&index),
            Arc::clone(&monitor),
        ));
        Self {
            store,
            index,
            monitor,
            reindexer,
            config: Arc::new(config),
        }
    }

    /// Returns the service for entity type `E`.
    pub fn service<E: Entity>(&self) -> EntityService<E> {
        EntityService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.index),
            Arc::clone(&self.monitor),
        )
    }

    /// Returns the primary store.
    pub fn store(&self) -> &dyn PrimaryStore {
        self.store.as_ref()
    }

    /// Returns the search index.
    pub fn index(&self) -> &dyn SearchIndex {
        self.index.as_ref()
    }

    /// Returns the sync monitor.
    pub fn monitor(&self) -> &SyncMonitor {
        &self.monitor
    }

    /// Returns the reindexer.
    pub fn reindexer(&self) -> &Reindexer {
        &self.reindexer
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the application name used in alert headers.
    pub fn app_name(&self) -> &str {
        &self.config.app_name
    }

    /// Returns the base URL for the server.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the default page size.
    pub fn default_page_size(&self) -> u64 {
        self.config.default_page_size
    }

    /// Returns the maximum page size.
    pub fn max_page_size(&self) -> u64 {
        self.config.max_page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plates_persistence::backends::memory::MemoryIndex;
    use plates_persistence::core::BackendKind;
    use plates_persistence::domain::{EntityDescriptor, EntityId};
    use plates_persistence::{Page, PageRequest, StorageResult};
    use serde_json::Value;

    // Mock store for testing
    struct MockStore;

    #[async_trait]
    impl PrimaryStore for MockStore {
        fn kind(&self) -> BackendKind {
            BackendKind::Custom("mock")
        }

        async fn save(
            &self,
            _entity: &'static EntityDescriptor,
            _document: Value,
        ) -> StorageResult<Value> {
            unimplemented!()
        }

        async fn find_one(
            &self,
            _entity: &'static EntityDescriptor,
            _id: EntityId,
        ) -> StorageResult<Option<Value>> {
            unimplemented!()
        }

        async fn find_all(&self, _entity: &'static EntityDescriptor) -> StorageResult<Vec<Value>> {
            unimplemented!()
        }

        async fn find_page(
            &self,
            _entity: &'static EntityDescriptor,
            _page: &PageRequest,
            _eager: bool,
        ) -> StorageResult<Page<Value>> {
            unimplemented!()
        }

        async fn delete(
            &self,
            _entity: &'static EntityDescriptor,
            _id: EntityId,
        ) -> StorageResult<bool> {
            unimplemented!()
        }

        async fn count(&self, _entity: &'static EntityDescriptor) -> StorageResult<u64> {
            unimplemented!()
        }

        async fn health_check(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn state(config: ServerConfig) -> AppState {
        AppState::new(Arc::new(MockStore), Arc::new(MemoryIndex::new()), config)
    }

    #[test]
    fn test_app_state_creation() {
        let state = state(ServerConfig::default());

        assert_eq!(state.store().backend_name(), "mock");
        assert_eq!(state.index().backend_name(), "memory");
        assert_eq!(state.app_name(), "platesApp");
    }

    #[test]
    fn test_app_state_config_access() {
        let state = state(ServerConfig {
            app_name: "gallery".to_string(),
            base_url: "https://plates.example.com".to_string(),
            default_page_size: 50,
            max_page_size: 500,
            ..Default::default()
        });

        assert_eq!(state.app_name(), "gallery");
        assert_eq!(state.base_url(), "https://plates.example.com");
        assert_eq!(state.default_page_size(), 50);
        assert_eq!(state.max_page_size(), 500);
    }

    #[test]
    fn test_app_state_clone_shares_monitor() {
        let state = state(ServerConfig::default());
        let cloned = state.clone();

        state.monitor().record_failure("memory", "boom");
        assert_eq!(cloned.monitor().backend_health("memory").consecutive_failures, 1);
    }
}
