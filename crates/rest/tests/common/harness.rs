//! REST API test harness.
//!
//! Provides infrastructure for testing the REST API endpoints.

use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use plates_persistence::backends::sqlite::SqliteBackend;
use plates_persistence::{CachedStore, PrimaryStore, SearchIndex};
use serde_json::Value;

use plates_rest::{ServerConfig, create_app_with_config};

use super::assertions::{assert_status, id_of};
use super::flaky::FlakyIndex;

/// Test harness for REST API testing.
///
/// Runs the full application over an in-memory SQLite store and a search
/// index that can be made to fail.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_read() {
///     let harness = RestTestHarness::new();
///
///     let plate = harness.create("plates", json!({"plateTitle": "Willow"})).await;
///     let response = harness.server.get(&format!("/api/plates/{}", id_of(&plate))).await;
///
///     assert_eq!(response.status_code(), 200);
/// }
/// ```
pub struct RestTestHarness {
    /// The test server instance.
    pub server: TestServer,

    /// The search index behind the server.
    pub index: Arc<FlakyIndex>,

    /// Server configuration.
    pub config: ServerConfig,
}

impl RestTestHarness {
    /// Creates a harness with the testing configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::for_testing())
    }

    /// Creates a harness with a custom configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
        backend.init_schema().expect("Failed to init schema");
        let store = CachedStore::new(backend, &config.cache_config());

        Self::with_backends(Arc::new(store), config)
    }

    /// Creates a harness over a custom primary store.
    pub fn with_backends(store: Arc<dyn PrimaryStore>, config: ServerConfig) -> Self {
        let index = Arc::new(FlakyIndex::new());
        let app = create_app_with_config(
            store,
            Arc::clone(&index) as Arc<dyn SearchIndex>,
            config.clone(),
        );
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            index,
            config,
        }
    }

    /// Creates an entity through the API and returns the response body.
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let response = self.server.post(&format!("/api/{}", path)).json(&body).await;
        assert_status(&response, 201);
        response.json()
    }

    /// Creates an entity and returns its id.
    pub async fn create_id(&self, path: &str, body: Value) -> i64 {
        id_of(&self.create(path, body).await)
    }

    /// Lists entities with a raw query string.
    pub async fn list(&self, path: &str, query: &str) -> TestResponse {
        self.server
            .get(&format!("/api/{}?{}", path, query))
            .await
    }

    /// Reads the current health report.
    pub async fn health(&self) -> TestResponse {
        self.server.get("/management/health").await
    }
}
