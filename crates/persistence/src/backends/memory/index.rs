//! In-process [`SearchIndex`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::{BackendKind, SearchIndex};
use crate::domain::{EntityDescriptor, EntityId};
use crate::error::{StorageError, StorageResult, ValidationError};
use crate::types::{Page, PageRequest, SortDirection, SortOrder};

use super::query::{self, FlatDocument};

type Collection = BTreeMap<EntityId, Value>;

/// A search index held in memory.
///
/// Documents are kept per entity type in id order. Queries use the syntax
/// described in [`query`](super::query). Writes are visible immediately.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<&'static str, Collection>>,
}

impl MemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key<'a>(document: &'a Value, property: &str) -> Option<&'a Value> {
    match document.get(property)? {
        Value::Null => None,
        Value::Object(map) => map.get("id"),
        value => Some(value),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare(a: &Value, b: &Value, order: &[SortOrder]) -> Ordering {
    for SortOrder {
        property,
        direction,
    } in order
    {
        let ordering = match (sort_key(a, property), sort_key(b, property)) {
            (Some(x), Some(y)) => {
                let ordering = compare_values(x, y);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            // Missing values sort last in either direction.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn index(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
        document: &Value,
    ) -> StorageResult<()> {
        self.collections
            .write()
            .entry(entity.index)
            .or_default()
            .insert(id, document.clone());
        Ok(())
    }

    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId) -> StorageResult<()> {
        if let Some(collection) = self.collections.write().get_mut(entity.index) {
            collection.remove(&id);
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
        if let Some(order) = page.sort.iter().find(|o| !entity.is_sortable(&o.property)) {
            return Err(StorageError::Validation(
                ValidationError::InvalidSortProperty {
                    entity: entity.name.to_string(),
                    property: order.property.clone(),
                },
            ));
        }
        let parsed = query::parse(query).map_err(StorageError::Search)?;

        // Collections iterate in id order, so a stable sort keeps id as the
        // final tie-breaker.
        let mut hits: Vec<Value> = {
            let collections = self.collections.read();
            collections
                .get(entity.index)
                .map(|collection| {
                    collection
                        .values()
                        .filter(|doc| parsed.matches(&FlatDocument::new(doc)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        if !page.sort.is_empty() {
            hits.sort_by(|a, b| compare(a, b, &page.sort));
        }

        let total = hits.len() as u64;
        let content = hits
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect::<Vec<_>>();

        debug!(total, returned = content.len(), "Search completed");
        Ok(Page::new(content, total, page))
    }

    async fn clear(&self, entity: &'static EntityDescriptor) -> StorageResult<()> {
        self.collections.write().remove(entity.index);
        Ok(())
    }

    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64> {
        Ok(self
            .collections
            .read()
            .get(entity.index)
            .map_or(0, |c| c.len() as u64))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, Note, Plate};
    use crate::error::SearchError;
    use serde_json::json;

    async fn seeded() -> MemoryIndex {
        let index = MemoryIndex::new();
        let plates = [
            json!({"id": 1, "plateTitle": "Willow", "person": {"id": 7}}),
            json!({"id": 2, "plateTitle": "Blue Willow"}),
            json!({"id": 3, "plateTitle": "Imari", "person": {"id": 5}}),
        ];
        for plate in &plates {
            let id = plate["id"].as_i64().unwrap();
            index.index(Plate::descriptor(), id, plate).await.unwrap();
        }
        index
    }

    fn ids(page: &Page<Value>) -> Vec<i64> {
        page.content.iter().map(|d| d["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_search_matches_and_counts() {
        let index = seeded().await;
        let page = index
            .search(Plate::descriptor(), "willow", &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![1, 2]);
        assert_eq!(page.total, 2);

        let page = index
            .search(Plate::descriptor(), "*", &PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![3]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_collections_are_per_entity() {
        let index = seeded().await;
        index
            .index(Note::descriptor(), 1, &json!({"id": 1, "title": "Willow"}))
            .await
            .unwrap();
        assert_eq!(index.count(Plate::descriptor()).await.unwrap(), 3);
        assert_eq!(index.count(Note::descriptor()).await.unwrap(), 1);

        index.clear(Plate::descriptor()).await.unwrap();
        assert_eq!(index.count(Plate::descriptor()).await.unwrap(), 0);
        assert_eq!(index.count(Note::descriptor()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sorting() {
        let index = seeded().await;
        let page = PageRequest::default().with_sort(SortOrder::asc("plateTitle"));
        let result = index.search(Plate::descriptor(), "*", &page).await.unwrap();
        assert_eq!(ids(&result), vec![2, 3, 1]);

        let page = PageRequest::default().with_sort(SortOrder::desc("person"));
        let result = index.search(Plate::descriptor(), "*", &page).await.unwrap();
        assert_eq!(ids(&result), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn test_reindex_replaces_and_delete_removes() {
        let index = seeded().await;
        index
            .index(Plate::descriptor(), 1, &json!({"id": 1, "plateTitle": "Imari"}))
            .await
            .unwrap();
        let page = index
            .search(Plate::descriptor(), "plateTitle:imari", &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![1, 3]);

        index.delete(Plate::descriptor(), 3).await.unwrap();
        index.delete(Plate::descriptor(), 42).await.unwrap();
        assert_eq!(index.count(Plate::descriptor()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_errors() {
        let index = seeded().await;
        let err = index
            .search(Plate::descriptor(), "(willow", &PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Search(SearchError::QueryParseError { .. })
        ));

        let page = PageRequest::default().with_sort(SortOrder::asc("colour"));
        let err = index
            .search(Plate::descriptor(), "*", &page)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::InvalidSortProperty { .. })
        ));
    }
}
