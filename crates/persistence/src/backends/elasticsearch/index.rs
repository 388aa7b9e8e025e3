//! [`SearchIndex`] implementation for Elasticsearch.

use async_trait::async_trait;
use elasticsearch::indices::IndicesRefreshParts;
use elasticsearch::{CountParts, DeleteParts, IndexParts, SearchParts};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::core::{BackendKind, SearchIndex};
use crate::domain::{EntityDescriptor, EntityId};
use crate::error::{SearchError, StorageError, StorageResult, ValidationError};
use crate::types::{Page, PageRequest};

use super::backend::{ElasticsearchIndex, internal_error};
use super::schema;

/// Builds the search request body.
pub(crate) fn build_search_body(
    entity: &EntityDescriptor,
    query: &str,
    page: &PageRequest,
    max_result_window: u64,
) -> StorageResult<Value> {
    let from = page.offset();
    if from.saturating_add(page.size) > max_result_window {
        return Err(StorageError::Search(SearchError::ResultWindowExceeded {
            offset: from,
            max: max_result_window,
        }));
    }

    let sort = page
        .sort
        .iter()
        .map(|order| {
            let field = schema::sort_field(entity, &order.property).ok_or_else(|| {
                StorageError::Validation(ValidationError::InvalidSortProperty {
                    entity: entity.name.to_string(),
                    property: order.property.clone(),
                })
            })?;
            Ok(json!({ field: { "order": order.direction.as_str() } }))
        })
        .collect::<StorageResult<Vec<_>>>()?;

    let mut body = json!({
        "query": { "query_string": { "query": query } },
        "from": from,
        "size": page.size,
        "track_total_hits": true
    });
    if !sort.is_empty() {
        body["sort"] = Value::Array(sort);
    }
    Ok(body)
}

/// Error types Elasticsearch reports for an unparseable query string.
const QUERY_ERROR_TYPES: &[&str] = &[
    "query_shard_exception",
    "parse_exception",
    "search_phase_execution_exception",
];

/// Reads `error.type` and every `error.root_cause[].type` from an error body.
fn error_types(body: &Value) -> Vec<&str> {
    let Some(error) = body.get("error") else {
        return Vec::new();
    };
    let root_causes = error
        .get("root_cause")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|cause| cause.get("type").and_then(Value::as_str));
    error
        .get("type")
        .and_then(Value::as_str)
        .into_iter()
        .chain(root_causes)
        .collect()
}

fn has_error_type(body: &Value, types: &[&str]) -> bool {
    error_types(body).iter().any(|t| types.contains(t))
}

fn is_query_error(body: &Value) -> bool {
    has_error_type(body, QUERY_ERROR_TYPES)
}

fn is_index_not_found(body: &Value) -> bool {
    has_error_type(body, &["index_not_found_exception"])
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Elasticsearch
    }

    #[instrument(skip(self, entity, document), fields(entity = entity.name))]
    async fn index(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
        document: &Value,
    ) -> StorageResult<()> {
        self.ensure_index(entity).await?;
        let index = self.index_name(entity);
        let doc_id = id.to_string();

        let response = self
            .client()
            .index(IndexParts::IndexId(&index, &doc_id))
            .body(document)
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to index document: {}", e)))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to index document (status {}): {}",
                status, body
            )));
        }

        debug!(index = %index, id, "Indexed document");
        Ok(())
    }

    #[instrument(skip(self, entity), fields(entity = entity.name))]
    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId) -> StorageResult<()> {
        let index = self.index_name(entity);
        let doc_id = id.to_string();

        let response = self
            .client()
            .delete(DeleteParts::IndexId(&index, &doc_id))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to delete document: {}", e)))?;

        let status = response.status_code();
        // 404 covers both a missing document and a missing index.
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to delete document (status {}): {}",
                status, body
            )));
        }

        Ok(())
    }

    #[instrument(skip(self, entity, page), fields(entity = entity.name, page = page.page, size = page.size))]
    async fn search(
        &self,
        entity: &'static EntityDescriptor,
        query: &str,
        page: &PageRequest,
    ) -> StorageResult<Page<Value>> {
        let index = self.index_name(entity);
        let body = build_search_body(entity, query, page, self.config().max_result_window)?;

        let response = self
            .client()
            .search(SearchParts::Index(&[&index]))
            .body(body)
            .send()
            .await
            .map_err(|e| internal_error(format!("Search request failed: {}", e)))?;

        let status = response.status_code();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            if is_index_not_found(&body) {
                return Ok(Page::new(Vec::new(), 0, page));
            }
            if status.as_u16() == 400 && is_query_error(&body) {
                return Err(StorageError::Search(SearchError::QueryParseError {
                    message: text,
                }));
            }
            return Err(internal_error(format!("Search failed: {}", text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse search response: {}", e)))?;

        let total = body
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.get("value"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let content = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(|h| h.as_array())
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit.get("_source").cloned())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        debug!(total, returned = content.len(), "Search completed");
        Ok(Page::new(content, total, page))
    }

    async fn clear(&self, entity: &'static EntityDescriptor) -> StorageResult<()> {
        schema::delete_index(self, entity).await?;
        self.forget_index(entity);
        self.ensure_index(entity).await
    }

    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64> {
        let index = self.index_name(entity);
        let response = self
            .client()
            .count(CountParts::Index(&[&index]))
            .send()
            .await
            .map_err(|e| internal_error(format!("Count request failed: {}", e)))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(0);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!("Count failed: {}", body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse count response: {}", e)))?;
        Ok(body.get("count").and_then(Value::as_u64).unwrap_or(0))
    }

    async fn refresh(&self, entity: &'static EntityDescriptor) -> StorageResult<()> {
        let index = self.index_name(entity);
        let response = self
            .client()
            .indices()
            .refresh(IndicesRefreshParts::Index(&[&index]))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to refresh index {}: {}", index, e)))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to refresh index {} (status {}): {}",
                index, status, body
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.cluster_health().await
    }
}
