//! Divergence records for the dual write.
//!
//! The primary store is written first. When the follow-up index write fails
//! the two stores disagree until the document is written again or the index
//! is rebuilt. Each such failure is captured as a [`DivergenceRecord`].

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::EntityId;

/// The index operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    /// Mirroring a saved document.
    Index,
    /// Removing a deleted document.
    Delete,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOperation::Index => write!(f, "index"),
            SyncOperation::Delete => write!(f, "delete"),
        }
    }
}

/// A primary write whose index counterpart failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceRecord {
    /// Entity name.
    pub entity: String,
    /// Entity id.
    pub id: EntityId,
    /// Failed operation.
    pub operation: SyncOperation,
    /// Error reported by the index.
    pub error: String,
    /// When the failure happened.
    pub recorded_at: DateTime<Utc>,
}

impl DivergenceRecord {
    /// Creates a record stamped with the current time.
    pub fn new(
        entity: impl Into<String>,
        id: EntityId,
        operation: SyncOperation,
        error: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            id,
            operation,
            error: error.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Bounded, oldest-first log of divergence records.
#[derive(Debug)]
pub(crate) struct DivergenceLog {
    records: VecDeque<DivergenceRecord>,
    capacity: usize,
    dropped: u64,
}

impl DivergenceLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Appends a record, evicting the oldest when full. A newer record for
    /// the same entity and id replaces the older one.
    pub(crate) fn push(&mut self, record: DivergenceRecord) {
        self.records
            .retain(|r| !(r.entity == record.entity && r.id == record.id));
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    /// Removes records for one entity type. Returns how many were removed.
    pub(crate) fn clear_entity(&mut self, entity: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.entity != entity);
        before - self.records.len()
    }

    /// Removes the record for one document, if any.
    pub(crate) fn resolve(&mut self, entity: &str, id: EntityId) {
        self.records.retain(|r| !(r.entity == entity && r.id == id));
    }

    pub(crate) fn records(&self) -> Vec<DivergenceRecord> {
        self.records.iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, id: EntityId) -> DivergenceRecord {
        DivergenceRecord::new(entity, id, SyncOperation::Index, "boom")
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = DivergenceLog::new(2);
        log.push(record("plate", 1));
        log.push(record("plate", 2));
        log.push(record("plate", 3));
        let ids: Vec<_> = log.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(log.dropped(), 1);
    }

    #[test]
    fn test_newer_record_replaces_older() {
        let mut log = DivergenceLog::new(10);
        log.push(record("plate", 1));
        log.push(DivergenceRecord::new(
            "plate",
            1,
            SyncOperation::Delete,
            "gone",
        ));
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].operation, SyncOperation::Delete);
    }

    #[test]
    fn test_clear_and_resolve() {
        let mut log = DivergenceLog::new(10);
        log.push(record("plate", 1));
        log.push(record("plate", 2));
        log.push(record("note", 1));
        log.resolve("plate", 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.clear_entity("plate"), 1);
        assert_eq!(log.records()[0].entity, "note");
    }

    #[test]
    fn test_record_serialization() {
        let value = serde_json::to_value(record("plateHistory", 4)).unwrap();
        assert_eq!(value["entity"], "plateHistory");
        assert_eq!(value["operation"], "index");
        assert!(value.get("recordedAt").is_some());
    }
}
