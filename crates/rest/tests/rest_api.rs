//! End-to-end tests for the plates REST API.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use common::*;
use plates_persistence::core::{BackendKind, PrimaryStore};
use plates_persistence::domain::{EntityDescriptor, EntityId};
use plates_persistence::error::{BackendError, StorageError, StorageResult};
use plates_persistence::{Page, PageRequest};
use plates_rest::ServerConfig;

// ============================================================================
// Create / update
// ============================================================================

#[tokio::test]
async fn test_create_returns_location_and_alert() {
    let harness = RestTestHarness::new();

    let response = harness
        .server
        .post("/api/plates")
        .json(&json!({"plateTitle": "Blue Willow"}))
        .await;

    assert_status(&response, 201);
    let body: Value = response.json();
    let id = id_of(&body);
    assert_eq!(body["plateTitle"], "Blue Willow");
    assert_header(&response, "location", &format!("/api/plates/{}", id));
    assert_header(&response, "x-platesapp-alert", "platesApp.plate.created");
    assert_header(&response, "x-platesapp-params", &id.to_string());
}

#[tokio::test]
async fn test_create_with_id_is_rejected() {
    let harness = RestTestHarness::new();
    harness.create("notes", json!({"title": "first"})).await;

    let response = harness
        .server
        .post("/api/notes")
        .json(&json!({"id": 42, "title": "second"}))
        .await;

    assert_problem(&response, "note", "idexists");
    assert_eq!(total_count(&harness.list("notes", "").await), 1);
}

#[tokio::test]
async fn test_update_without_id_is_rejected() {
    let harness = RestTestHarness::new();

    let response = harness
        .server
        .put("/api/regions")
        .json(&json!({"regionName": "Europe"}))
        .await;

    assert_problem(&response, "region", "idnull");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let harness = RestTestHarness::new();

    let response = harness
        .server
        .put("/api/regions")
        .json(&json!({"id": 999, "regionName": "Europe"}))
        .await;

    assert_status(&response, 404);
    assert!(response.text().is_empty());
}

#[tokio::test]
async fn test_update_replaces_fields() {
    let harness = RestTestHarness::new();
    let id = harness
        .create_id("regions", json!({"regionName": "Europa"}))
        .await;

    let response = harness
        .server
        .put("/api/regions")
        .json(&json!({"id": id, "regionName": "Europe"}))
        .await;

    assert_status(&response, 200);
    assert_header(&response, "x-platesapp-alert", "platesApp.region.updated");
    assert_header(&response, "x-platesapp-params", &id.to_string());

    let read: Value = harness
        .server
        .get(&format!("/api/regions/{}", id))
        .await
        .json();
    assert_eq!(read["regionName"], "Europe");
}

#[tokio::test]
async fn test_missing_required_field() {
    let harness = RestTestHarness::new();

    let response = harness.server.post("/api/departments").json(&json!({})).await;

    assert_problem(&response, "department", "required");
}

#[tokio::test]
async fn test_malformed_body() {
    let harness = RestTestHarness::new();

    let response = harness
        .server
        .post("/api/notes")
        .text("{\"title\": ")
        .content_type("application/json")
        .await;

    assert_problem(&response, "note", "invalidbody");
}

#[tokio::test]
async fn test_unknown_reference_is_constraint_violation() {
    let harness = RestTestHarness::new();

    let response = harness
        .server
        .post("/api/plates")
        .json(&json!({"plateTitle": "Orphan", "person": {"id": 999}}))
        .await;

    assert_problem(&response, "plate", "constraintviolation");
}

// ============================================================================
// Read / delete
// ============================================================================

#[tokio::test]
async fn test_read_missing_is_empty_not_found() {
    let harness = RestTestHarness::new();

    let response = harness.server.get("/api/people/12345").await;

    assert_status(&response, 404);
    assert!(response.text().is_empty());
    assert_no_header(&response, "x-platesapp-error");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let harness = RestTestHarness::new();
    let id = harness.create_id("countries", json!({"countryName": "Norway"})).await;

    for _ in 0..2 {
        let response = harness.server.delete(&format!("/api/countries/{}", id)).await;
        assert_status(&response, 204);
        assert_header(&response, "x-platesapp-alert", "platesApp.country.deleted");
    }

    let response = harness.server.get(&format!("/api/countries/{}", id)).await;
    assert_status(&response, 404);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_pagination_headers() {
    let harness = RestTestHarness::new();
    for i in 0..25 {
        harness
            .create("notes", json!({"title": format!("note {}", i)}))
            .await;
    }

    let response = harness.list("notes", "page=0").await;

    assert_status(&response, 200);
    assert_eq!(body_array(&response).len(), 20);
    assert_eq!(total_count(&response), 25);
    let link = response
        .maybe_header("link")
        .expect("Link header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(link.contains("page=1&size=20>; rel=\"next\""));
    assert!(link.contains("page=1&size=20>; rel=\"last\""));
    assert!(link.contains("page=0&size=20>; rel=\"first\""));
    assert!(!link.contains("rel=\"prev\""));

    let second = harness.list("notes", "page=1").await;
    assert_eq!(body_array(&second).len(), 5);
}

#[tokio::test]
async fn test_list_size_is_capped() {
    let harness = RestTestHarness::new();
    for i in 0..3 {
        harness.create("regions", json!({"regionName": format!("r{}", i)})).await;
    }

    let response = harness.list("regions", "size=100000").await;

    assert_status(&response, 200);
    let link = response.maybe_header("link").unwrap();
    assert!(link.to_str().unwrap().contains(&format!(
        "size={}",
        harness.config.max_page_size
    )));
}

#[tokio::test]
async fn test_list_sort_descending() {
    let harness = RestTestHarness::new();
    for title in ["apple", "cherry", "banana"] {
        harness.create("notes", json!({"title": title})).await;
    }

    let response = harness.list("notes", "sort=title,desc").await;

    let titles: Vec<String> = body_array(&response)
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["cherry", "banana", "apple"]);
}

#[tokio::test]
async fn test_list_invalid_parameters() {
    let harness = RestTestHarness::new();

    assert_problem(&harness.list("notes", "sort=bogus,asc").await, "note", "invalidsort");
    assert_problem(&harness.list("notes", "page=first").await, "note", "invalidparam");
    assert_problem(&harness.list("plates", "eagerload=maybe").await, "plate", "invalidparam");
}

#[tokio::test]
async fn test_eagerload_controls_collections() {
    let harness = RestTestHarness::new();
    let note = harness.create_id("notes", json!({"title": "glaze"})).await;
    let plate = harness
        .create_id(
            "plates",
            json!({"plateTitle": "Blue Willow", "notes": [{"id": note}]}),
        )
        .await;

    let lazy = body_array(&harness.list("plates", "").await);
    assert!(lazy[0].get("notes").is_none());

    let eager = body_array(&harness.list("plates", "eagerload=true").await);
    assert_eq!(eager[0]["notes"], json!([{"id": note}]));

    let read: Value = harness
        .server
        .get(&format!("/api/plates/{}", plate))
        .await
        .json();
    assert_eq!(read["notes"], json!([{"id": note}]));
}

#[tokio::test]
async fn test_update_without_notes_clears_them() {
    let harness = RestTestHarness::new();
    let note = harness.create_id("notes", json!({"title": "crazing"})).await;
    let plate = harness
        .create_id(
            "plates",
            json!({"plateTitle": "Blue Willow", "notes": [{"id": note}]}),
        )
        .await;

    let response = harness
        .server
        .put("/api/plates")
        .json(&json!({"id": plate, "plateTitle": "Blue Willow II"}))
        .await;
    assert_status(&response, 200);

    let read: Value = harness
        .server
        .get(&format!("/api/plates/{}", plate))
        .await
        .json();
    assert_eq!(read["plateTitle"], "Blue Willow II");
    assert_eq!(read["notes"], json!([]));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_finds_indexed_entities() {
    let harness = RestTestHarness::new();
    harness.create("plates", json!({"plateTitle": "Blue Willow"})).await;
    harness.create("plates", json!({"plateTitle": "Green Meadow"})).await;

    let response = harness
        .server
        .get("/api/_search/plates?query=willow")
        .await;

    assert_status(&response, 200);
    let hits = body_array(&response);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["plateTitle"], "Blue Willow");
    assert_eq!(total_count(&response), 1);
}

#[tokio::test]
async fn test_search_query_errors() {
    let harness = RestTestHarness::new();

    let missing = harness.server.get("/api/_search/plates").await;
    assert_problem(&missing, "plate", "querymissing");

    let invalid = harness.server.get("/api/_search/plates?query=%28blue").await;
    assert_problem(&invalid, "plate", "invalidquery");

    let deep = format!(
        "/api/_search/notes?query={}a{}",
        "%28".repeat(10_000),
        "%29".repeat(10_000)
    );
    assert_problem(&harness.server.get(&deep).await, "note", "invalidquery");
}

#[tokio::test]
async fn test_deleted_entities_leave_the_index() {
    let harness = RestTestHarness::new();
    let id = harness.create_id("notes", json!({"title": "chipped"})).await;

    harness.server.delete(&format!("/api/notes/{}", id)).await;

    let response = harness.server.get("/api/_search/notes?query=chipped").await;
    assert!(body_array(&response).is_empty());
}

// ============================================================================
// Management
// ============================================================================

#[tokio::test]
async fn test_health_up() {
    let harness = RestTestHarness::new();

    let response = harness.health().await;

    assert_status(&response, 200);
    let report: Value = response.json();
    assert_eq!(report["status"], "UP");
    assert_eq!(report["divergenceCount"], 0);
    assert_eq!(report["primary"]["healthy"], true);
}

#[tokio::test]
async fn test_index_failure_degrades_and_reindex_repairs() {
    let harness = RestTestHarness::new();
    harness.index.set_failing(true);

    let response = harness
        .server
        .post("/api/plates")
        .json(&json!({"plateTitle": "Blue Willow"}))
        .await;
    assert_status(&response, 201);

    let report: Value = harness.health().await.json();
    assert_eq!(report["status"], "DEGRADED");
    assert_eq!(report["divergenceCount"], 1);

    harness.index.set_failing(false);
    let reindex = harness
        .server
        .post("/management/reindex")
        .json(&json!({"entityTypes": ["plate"]}))
        .await;
    assert_status(&reindex, 200);
    let summary: Value = reindex.json();
    assert_eq!(summary["status"], "completed");

    let report: Value = harness.health().await.json();
    assert_eq!(report["status"], "UP");
    assert_eq!(report["divergenceCount"], 0);

    let hits = harness.server.get("/api/_search/plates?query=willow").await;
    assert_eq!(body_array(&hits).len(), 1);
}

#[tokio::test]
async fn test_reindex_without_body_covers_every_entity() {
    let harness = RestTestHarness::new();
    harness.create("regions", json!({"regionName": "Asia"})).await;

    let response = harness.server.post("/management/reindex").await;

    assert_status(&response, 200);
    let summary: Value = response.json();
    assert_eq!(summary["entities"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_reindex_unknown_entity() {
    let harness = RestTestHarness::new();

    let response = harness
        .server
        .post("/management/reindex")
        .json(&json!({"entityTypes": ["spaceship"]}))
        .await;

    assert_status(&response, 400);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "unsupportedentity");
}

/// A primary store that is never reachable.
struct DownStore;

impl DownStore {
    fn unavailable<T>() -> StorageResult<T> {
        Err(StorageError::Backend(BackendError::Unavailable {
            backend_name: "down".to_string(),
            message: "connection refused".to_string(),
        }))
    }
}

#[async_trait]
impl PrimaryStore for DownStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom("down")
    }

    async fn save(&self, _entity: &'static EntityDescriptor, _document: Value) -> StorageResult<Value> {
        Self::unavailable()
    }

    async fn find_one(
        &self,
        _entity: &'static EntityDescriptor,
        _id: EntityId,
    ) -> StorageResult<Option<Value>> {
        Self::unavailable()
    }

    async fn find_all(&self, _entity: &'static EntityDescriptor) -> StorageResult<Vec<Value>> {
        Self::unavailable()
    }

    async fn find_page(
        &self,
        _entity: &'static EntityDescriptor,
        _page: &PageRequest,
        _eager: bool,
    ) -> StorageResult<Page<Value>> {
        Self::unavailable()
    }

    async fn delete(&self, _entity: &'static EntityDescriptor, _id: EntityId) -> StorageResult<bool> {
        Self::unavailable()
    }

    async fn count(&self, _entity: &'static EntityDescriptor) -> StorageResult<u64> {
        Self::unavailable()
    }

    async fn health_check(&self) -> StorageResult<()> {
        Self::unavailable()
    }
}

#[tokio::test]
async fn test_health_down_when_primary_unavailable() {
    let harness = RestTestHarness::with_backends(Arc::new(DownStore), ServerConfig::for_testing());

    let response = harness.health().await;

    assert_status(&response, 503);
    let report: Value = response.json();
    assert_eq!(report["status"], "DOWN");
    assert_eq!(report["primary"]["healthy"], false);
}

#[tokio::test]
async fn test_backend_failure_is_internal_error() {
    let harness = RestTestHarness::with_backends(Arc::new(DownStore), ServerConfig::for_testing());

    let response = harness.list("notes", "").await;

    assert_status(&response, 500);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "http.500");
    assert_header(&response, "x-platesapp-error", "error.http.500");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let config = ServerConfig {
        enable_request_id: true,
        ..ServerConfig::for_testing()
    };
    let harness = RestTestHarness::with_config(config);

    let response = harness.list("regions", "").await;

    assert!(response.maybe_header("x-request-id").is_some());
}
