//! Rebuilding the search index from the primary store.
//!
//! Used to repair divergence left by failed index writes, or to populate a
//! fresh index. Documents are read from the primary store in id order, one
//! page of `batch_size` at a time, with owned collections loaded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::composite::SyncMonitor;
use crate::core::{PrimaryStore, SearchIndex};
use crate::domain::{EntityDescriptor, EntityId, descriptor_for, descriptors};
use crate::error::{StorageError, StorageResult, ValidationError};
use crate::types::{PageRequest, SortOrder};

/// Request to rebuild the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexRequest {
    /// Entity names, tables or REST paths to rebuild (None = all types).
    #[serde(default)]
    pub entity_types: Option<Vec<String>>,

    /// Documents read from the primary store per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Whether to empty each index collection before rebuilding it.
    #[serde(default)]
    pub clear_existing: bool,
}

fn default_batch_size() -> u32 {
    100
}

impl Default for ReindexRequest {
    fn default() -> Self {
        Self {
            entity_types: None,
            batch_size: default_batch_size(),
            clear_existing: false,
        }
    }
}

impl ReindexRequest {
    /// Creates a request for every entity type.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a request for specific entity types.
    pub fn for_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_types: Some(types.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Enables clearing existing documents first.
    pub fn clear_existing(mut self) -> Self {
        self.clear_existing = true;
        self
    }

    fn targets(&self) -> StorageResult<Vec<&'static EntityDescriptor>> {
        if self.batch_size == 0 {
            return Err(StorageError::Validation(ValidationError::InvalidField {
                entity: "reindex".to_string(),
                field: "batchSize".to_string(),
                message: "must be greater than zero".to_string(),
            }));
        }
        match &self.entity_types {
            None => Ok(descriptors().to_vec()),
            Some(types) => types
                .iter()
                .map(|name| {
                    descriptor_for(name).ok_or_else(|| {
                        StorageError::Validation(ValidationError::UnsupportedEntity {
                            entity: name.clone(),
                        })
                    })
                })
                .collect(),
        }
    }
}

/// Outcome of a reindex run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexStatus {
    /// Every document was indexed.
    Completed,
    /// Some documents or entity types failed.
    CompletedWithErrors,
}

/// Per-entity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReindexResult {
    /// Entity name.
    pub entity: String,
    /// Rows found in the primary store.
    pub total: u64,
    /// Documents written to the index.
    pub indexed: u64,
    /// Documents that could not be written.
    pub failed: u64,
}

/// An error encountered during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexItemError {
    /// Entity name.
    pub entity: String,
    /// Document id, or None when the whole entity type failed.
    pub id: Option<EntityId>,
    /// Error message.
    pub error: String,
}

/// Report of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    /// Unique run identifier.
    pub run_id: String,
    /// Outcome.
    pub status: ReindexStatus,
    /// Counts per entity type, in processing order.
    pub entities: Vec<EntityReindexResult>,
    /// Errors encountered.
    pub errors: Vec<ReindexItemError>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

impl ReindexReport {
    /// Returns the number of documents indexed across all types.
    pub fn indexed(&self) -> u64 {
        self.entities.iter().map(|e| e.indexed).sum()
    }

    /// Returns true if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Rebuilds index collections from the primary store.
pub struct Reindexer {
    store: Arc<dyn PrimaryStore>,
    index: Arc<dyn SearchIndex>,
    monitor: Arc<SyncMonitor>,
}

impl Reindexer {
    /// Creates a reindexer over shared backends.
    pub fn new(
        store: Arc<dyn PrimaryStore>,
        index: Arc<dyn SearchIndex>,
        monitor: Arc<SyncMonitor>,
    ) -> Self {
        Self {
            store,
            index,
            monitor,
        }
    }

    /// Runs a reindex to completion.
    ///
    /// Failures of individual documents or entity types are collected in the
    /// report. An entity type that finishes without errors has its recorded
    /// divergence cleared.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation(UnsupportedEntity)` - unknown entity type
    /// * `StorageError::Validation(InvalidField)` - zero batch size
    #[instrument(skip(self, request), fields(batch_size = request.batch_size, clear = request.clear_existing))]
    pub async fn reindex(&self, request: &ReindexRequest) -> StorageResult<ReindexReport> {
        let targets = request.targets()?;
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(run_id = %run_id, entities = targets.len(), "Reindex started");

        let mut entities = Vec::with_capacity(targets.len());
        let mut errors = Vec::new();
        for entity in targets {
            let before = errors.len();
            let result = self.reindex_entity(entity, request, &mut errors).await;
            if errors.len() == before {
                let cleared = self.monitor.clear_divergence(entity.name);
                if cleared > 0 {
                    info!(entity = entity.name, cleared, "Cleared divergence");
                }
            }
            entities.push(result);
        }

        let status = if errors.is_empty() {
            ReindexStatus::Completed
        } else {
            ReindexStatus::CompletedWithErrors
        };
        let report = ReindexReport {
            run_id,
            status,
            entities,
            errors,
            started_at,
            completed_at: Utc::now(),
        };
        info!(
            run_id = %report.run_id,
            indexed = report.indexed(),
            errors = report.errors.len(),
            "Reindex finished"
        );
        Ok(report)
    }

    async fn reindex_entity(
        &self,
        entity: &'static EntityDescriptor,
        request: &ReindexRequest,
        errors: &mut Vec<ReindexItemError>,
    ) -> EntityReindexResult {
        let mut result = EntityReindexResult {
            entity: entity.name.to_string(),
            total: 0,
            indexed: 0,
            failed: 0,
        };
        let mut fail = |id: Option<EntityId>, error: &StorageError| {
            warn!(entity = entity.name, id = ?id, error = %error, "Reindex error");
            errors.push(ReindexItemError {
                entity: entity.name.to_string(),
                id,
                error: error.to_string(),
            });
        };

        if request.clear_existing {
            if let Err(e) = self.index.clear(entity).await {
                fail(None, &e);
                return result;
            }
        }

        let mut page_number = 0;
        loop {
            let page = PageRequest::new(page_number, u64::from(request.batch_size))
                .with_sort(SortOrder::asc("id"));
            let batch = match self.store.find_page(entity, &page, true).await {
                Ok(batch) => batch,
                Err(e) => {
                    fail(None, &e);
                    break;
                }
            };
            result.total = batch.total;

            for document in &batch.content {
                let Some(id) = document["id"].as_i64() else {
                    continue;
                };
                match self.index.index(entity, id, document).await {
                    Ok(()) => result.indexed += 1,
                    Err(e) => {
                        result.failed += 1;
                        fail(Some(id), &e);
                    }
                }
            }

            if !batch.has_next() {
                break;
            }
            page_number += 1;
        }

        if let Err(e) = self.index.refresh(entity).await {
            fail(None, &e);
        }
        result
    }
}

impl std::fmt::Debug for Reindexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reindexer")
            .field("store", &self.store.backend_name())
            .field("index", &self.index.backend_name())
            .finish()
    }
}
