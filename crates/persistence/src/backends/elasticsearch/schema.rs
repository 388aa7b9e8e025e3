//! Elasticsearch index mappings.
//!
//! Mappings are derived from the entity descriptor so the index always
//! matches the JSON form of the entity:
//!
//! - text fields are analyzed `text` with a `keyword` sub-field for sorting
//! - integers are `long`, instants are `date`
//! - references and owned collections are objects holding a `long` id

use elasticsearch::indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts};
use serde_json::{Map, Value, json};

use crate::domain::{EntityDescriptor, FieldKind};
use crate::error::StorageResult;

use super::backend::{ElasticsearchConfig, ElasticsearchIndex, internal_error};

fn reference_mapping() -> Value {
    json!({ "properties": { "id": { "type": "long" } } })
}

/// Creates the settings and mapping for one entity's index.
pub fn create_index_mapping(config: &ElasticsearchConfig, entity: &EntityDescriptor) -> Value {
    let mut properties = Map::new();
    properties.insert("id".to_string(), json!({ "type": "long" }));

    for field in entity.fields {
        let mapping = match field.kind {
            FieldKind::Text => json!({
                "type": "text",
                "fields": {
                    "keyword": { "type": "keyword", "ignore_above": 256 }
                }
            }),
            FieldKind::Integer => json!({ "type": "long" }),
            FieldKind::Instant => json!({ "type": "date" }),
            FieldKind::Reference { .. } => reference_mapping(),
        };
        properties.insert(field.name.to_string(), mapping);
    }
    for join in entity.joins {
        properties.insert(join.field.to_string(), reference_mapping());
    }

    json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas,
            "index.max_result_window": config.max_result_window,
            "refresh_interval": config.refresh_interval
        },
        "mappings": {
            "properties": properties
        }
    })
}

/// Returns the field to sort on for a property, or `None` if the property
/// cannot be sorted.
pub(crate) fn sort_field(entity: &EntityDescriptor, property: &str) -> Option<String> {
    if property == "id" {
        return Some("id".to_string());
    }
    let field = entity.field(property)?;
    Some(match field.kind {
        FieldKind::Text => format!("{}.keyword", field.name),
        FieldKind::Integer | FieldKind::Instant => field.name.to_string(),
        FieldKind::Reference { .. } => format!("{}.id", field.name),
    })
}

/// Ensures the index for the given entity exists, creating it if necessary.
pub async fn ensure_index(backend: &ElasticsearchIndex, entity: &EntityDescriptor) -> StorageResult<()> {
    let index = backend.index_name(entity);

    let exists_response = backend
        .client()
        .indices()
        .exists(IndicesExistsParts::Index(&[&index]))
        .send()
        .await
        .map_err(|e| internal_error(format!("Failed to check index existence: {}", e)))?;

    if exists_response.status_code().is_success() {
        return Ok(());
    }

    let mapping = create_index_mapping(backend.config(), entity);

    let response = backend
        .client()
        .indices()
        .create(IndicesCreateParts::Index(&index))
        .body(mapping)
        .send()
        .await
        .map_err(|e| internal_error(format!("Failed to create index {}: {}", index, e)))?;

    let status = response.status_code();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        // Lost a creation race with another writer.
        if body.contains("resource_already_exists_exception") {
            return Ok(());
        }
        return Err(internal_error(format!(
            "Failed to create index {} (status {}): {}",
            index, status, body
        )));
    }

    tracing::debug!("Created Elasticsearch index '{}'", index);
    Ok(())
}

/// Deletes the index for the given entity. A missing index is not an error.
pub async fn delete_index(backend: &ElasticsearchIndex, entity: &EntityDescriptor) -> StorageResult<()> {
    let index = backend.index_name(entity);

    let response = backend
        .client()
        .indices()
        .delete(IndicesDeleteParts::Index(&[&index]))
        .send()
        .await
        .map_err(|e| internal_error(format!("Failed to delete index {}: {}", index, e)))?;

    let status = response.status_code();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if !body.contains("index_not_found_exception") {
            return Err(internal_error(format!(
                "Failed to delete index {}: {}",
                index, body
            )));
        }
    }

    tracing::debug!("Deleted Elasticsearch index '{}'", index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, Person, Plate};

    #[test]
    fn test_create_index_mapping_structure() {
        let config = ElasticsearchConfig::default();
        let mapping = create_index_mapping(&config, Plate::descriptor());

        assert_eq!(mapping["settings"]["number_of_shards"], 1);
        assert_eq!(mapping["settings"]["index.max_result_window"], 10000);

        let props = &mapping["mappings"]["properties"];
        assert_eq!(props["id"]["type"], "long");
        assert_eq!(props["plateTitle"]["type"], "text");
        assert_eq!(props["plateTitle"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(props["person"]["properties"]["id"]["type"], "long");
        assert_eq!(props["notes"]["properties"]["id"]["type"], "long");
    }

    #[test]
    fn test_instant_and_integer_mappings() {
        let mapping = create_index_mapping(&ElasticsearchConfig::default(), Person::descriptor());
        let props = &mapping["mappings"]["properties"];
        assert_eq!(props["hireDate"]["type"], "date");
        assert_eq!(props["salary"]["type"], "long");
    }

    #[test]
    fn test_sort_field() {
        let plate = Plate::descriptor();
        assert_eq!(sort_field(plate, "id").as_deref(), Some("id"));
        assert_eq!(sort_field(plate, "plateTitle").as_deref(), Some("plateTitle.keyword"));
        assert_eq!(sort_field(plate, "person").as_deref(), Some("person.id"));
        assert_eq!(sort_field(plate, "notes"), None);
        assert_eq!(
            sort_field(Person::descriptor(), "hireDate").as_deref(),
            Some("hireDate")
        );
    }
}
