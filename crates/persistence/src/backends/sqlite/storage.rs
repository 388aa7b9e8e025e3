//! [`PrimaryStore`] implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::core::{BackendKind, PrimaryStore};
use crate::domain::{EntityDescriptor, EntityId, FieldDef, FieldKind, JoinDef};
use crate::error::{
    BackendError, ResourceError, StorageError, StorageResult, ValidationError,
};
use crate::types::{Page, PageRequest, SortOrder};

use super::SqliteBackend;

fn not_found(entity: &EntityDescriptor, id: EntityId) -> StorageError {
    StorageError::Resource(ResourceError::NotFound {
        entity: entity.name.to_string(),
        id,
    })
}

fn invalid_field(entity: &EntityDescriptor, field: &str, message: impl Into<String>) -> StorageError {
    StorageError::Validation(ValidationError::InvalidField {
        entity: entity.name.to_string(),
        field: field.to_string(),
        message: message.into(),
    })
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn reference_id(entity: &EntityDescriptor, field: &str, value: &Value) -> StorageResult<EntityId> {
    value
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid_field(entity, field, "reference requires a numeric id"))
}

/// Converts one JSON property to its column value.
fn column_value(
    entity: &EntityDescriptor,
    field: &FieldDef,
    value: Option<&Value>,
) -> StorageResult<SqlValue> {
    let value = match value {
        None | Some(Value::Null) if field.required => {
            return Err(StorageError::Validation(
                ValidationError::MissingRequiredField {
                    entity: entity.name.to_string(),
                    field: field.name.to_string(),
                },
            ));
        }
        None | Some(Value::Null) => return Ok(SqlValue::Null),
        Some(value) => value,
    };

    match field.kind {
        FieldKind::Text => value
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .ok_or_else(|| invalid_field(entity, field.name, "expected a string")),
        FieldKind::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid_field(entity, field.name, "expected an integer")),
        FieldKind::Instant => {
            let text = value.as_str().ok_or_else(|| {
                invalid_field(entity, field.name, "expected an RFC 3339 timestamp")
            })?;
            let instant = DateTime::parse_from_rfc3339(text)
                .map_err(|e| invalid_field(entity, field.name, e.to_string()))?;
            Ok(SqlValue::Text(format_instant(instant.with_timezone(&Utc))))
        }
        FieldKind::Reference { .. } => {
            reference_id(entity, field.name, value).map(SqlValue::Integer)
        }
    }
}

/// Reads the ids of an owned collection. An absent or null property is an
/// empty collection, so saving it clears the stored association.
fn collection_ids(
    entity: &EntityDescriptor,
    join: &JoinDef,
    value: Option<&Value>,
) -> StorageResult<Vec<EntityId>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| reference_id(entity, join.field, item))
            .collect(),
        Some(_) => Err(invalid_field(
            entity,
            join.field,
            "expected an array of references",
        )),
    }
}

fn select_sql(entity: &EntityDescriptor, eager: bool) -> String {
    let mut columns = vec!["t.id".to_string()];
    columns.extend(entity.fields.iter().map(|f| format!("t.{}", f.column)));
    if eager {
        // One correlated subquery per owned collection keeps the fetch to a
        // single statement.
        columns.extend(entity.joins.iter().map(|j| {
            format!(
                "(SELECT group_concat(j.{}) FROM {} j WHERE j.{} = t.id)",
                j.target_column, j.table, j.owner_column
            )
        }));
    }
    format!("SELECT {} FROM {} t", columns.join(", "), entity.table)
}

fn insert_sql(entity: &EntityDescriptor) -> String {
    if entity.fields.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", entity.table);
    }
    let columns: Vec<&str> = entity.fields.iter().map(|f| f.column).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        entity.table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn update_sql(entity: &EntityDescriptor) -> String {
    if entity.fields.is_empty() {
        return format!("UPDATE {} SET id = id WHERE id = ?1", entity.table);
    }
    let assignments: Vec<String> = entity
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ?{}", f.column, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        entity.table,
        assignments.join(", "),
        entity.fields.len() + 1
    )
}

fn order_by(entity: &EntityDescriptor, sort: &[SortOrder]) -> StorageResult<String> {
    let mut terms = Vec::with_capacity(sort.len() + 1);
    let mut sorted_by_id = false;
    for order in sort {
        let column = if order.property == "id" {
            sorted_by_id = true;
            "id"
        } else {
            entity
                .field(&order.property)
                .map(|f| f.column)
                .ok_or_else(|| {
                    StorageError::Validation(ValidationError::InvalidSortProperty {
                        entity: entity.name.to_string(),
                        property: order.property.clone(),
                    })
                })?
        };
        terms.push(format!("t.{} {}", column, order.direction.as_sql()));
    }
    // Stable paging needs a total order.
    if !sorted_by_id {
        terms.push("t.id ASC".to_string());
    }
    Ok(terms.join(", "))
}

fn parse_id_list(list: Option<&str>) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = list
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    ids.sort_unstable();
    ids
}

fn row_to_document(entity: &EntityDescriptor, row: &Row<'_>, eager: bool) -> rusqlite::Result<Value> {
    let mut document = Map::new();
    document.insert("id".to_string(), json!(row.get::<_, i64>(0)?));

    for (i, field) in entity.fields.iter().enumerate() {
        let idx = i + 1;
        let value = match field.kind {
            FieldKind::Text | FieldKind::Instant => {
                row.get::<_, Option<String>>(idx)?.map(Value::String)
            }
            FieldKind::Integer => row.get::<_, Option<i64>>(idx)?.map(Value::from),
            FieldKind::Reference { .. } => row
                .get::<_, Option<i64>>(idx)?
                .map(|id| json!({ "id": id })),
        };
        if let Some(value) = value {
            document.insert(field.name.to_string(), value);
        }
    }

    if eager {
        for (j, join) in entity.joins.iter().enumerate() {
            let idx = entity.fields.len() + 1 + j;
            let ids = parse_id_list(row.get::<_, Option<String>>(idx)?.as_deref());
            document.insert(
                join.field.to_string(),
                Value::Array(ids.into_iter().map(|id| json!({ "id": id })).collect()),
            );
        }
    }

    Ok(Value::Object(document))
}

fn read_one(
    conn: &Connection,
    entity: &EntityDescriptor,
    id: EntityId,
) -> StorageResult<Option<Value>> {
    let sql = format!("{} WHERE t.id = ?1", select_sql(entity, true));
    conn.query_row(&sql, [id], |row| row_to_document(entity, row, true))
        .optional()
        .map_err(StorageError::from)
}

fn replace_join_rows(
    conn: &Connection,
    join: &JoinDef,
    owner: EntityId,
    targets: &[EntityId],
) -> StorageResult<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", join.table, join.owner_column),
        [owner],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
        join.table, join.owner_column, join.target_column
    ))?;
    for target in targets {
        stmt.execute(params![owner, target])?;
    }
    Ok(())
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl PrimaryStore for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    #[instrument(skip(self, entity, document), fields(entity = entity.name))]
    async fn save(
        &self,
        entity: &'static EntityDescriptor,
        document: Value,
    ) -> StorageResult<Value> {
        let object = document
            .as_object()
            .ok_or_else(|| invalid_field(entity, "$", "expected a JSON object"))?;

        let id = match object.get("id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .ok_or_else(|| invalid_field(entity, "id", "expected an integer"))?,
            ),
        };

        let values = entity
            .fields
            .iter()
            .map(|f| column_value(entity, f, object.get(f.name)))
            .collect::<StorageResult<Vec<_>>>()?;
        let collections = entity
            .joins
            .iter()
            .map(|j| Ok((j, collection_ids(entity, j, object.get(j.field))?)))
            .collect::<StorageResult<Vec<_>>>()?;

        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let id = match id {
            None => {
                tx.execute(&insert_sql(entity), params_from_iter(values.iter()))?;
                tx.last_insert_rowid()
            }
            Some(id) => {
                let mut params = values;
                params.push(SqlValue::Integer(id));
                let changed = tx.execute(&update_sql(entity), params_from_iter(params.iter()))?;
                if changed == 0 {
                    return Err(not_found(entity, id));
                }
                id
            }
        };

        for (join, targets) in collections {
            replace_join_rows(&tx, join, id, &targets)?;
        }

        let stored = read_one(&tx, entity, id)?.ok_or_else(|| not_found(entity, id))?;
        tx.commit()?;

        debug!(id, "Saved row");
        Ok(stored)
    }

    async fn find_one(
        &self,
        entity: &'static EntityDescriptor,
        id: EntityId,
    ) -> StorageResult<Option<Value>> {
        let conn = self.get_connection()?;
        read_one(&conn, entity, id)
    }

    async fn find_all(&self, entity: &'static EntityDescriptor) -> StorageResult<Vec<Value>> {
        let conn = self.get_connection()?;
        let sql = format!("{} ORDER BY t.id", select_sql(entity, true));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| row_to_document(entity, row, true))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    #[instrument(skip(self, entity, page), fields(entity = entity.name, page = page.page, size = page.size))]
    async fn find_page(
        &self,
        entity: &'static EntityDescriptor,
        page: &PageRequest,
        eager: bool,
    ) -> StorageResult<Page<Value>> {
        let order = order_by(entity, &page.sort)?;
        let conn = self.get_connection()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", entity.table),
            [],
            |row| row.get(0),
        )?;

        let sql = format!(
            "{} ORDER BY {} LIMIT ?1 OFFSET ?2",
            select_sql(entity, eager),
            order
        );
        let mut stmt = conn.prepare(&sql)?;
        let content = stmt
            .query_map(
                params![to_sql_int(page.size), to_sql_int(page.offset())],
                |row| row_to_document(entity, row, eager),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, total.max(0) as u64, page))
    }

    #[instrument(skip(self, entity), fields(entity = entity.name))]
    async fn delete(&self, entity: &'static EntityDescriptor, id: EntityId) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", entity.table),
            [id],
        )?;
        debug!(id, deleted, "Deleted row");
        Ok(deleted > 0)
    }

    async fn count(&self, entity: &'static EntityDescriptor) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", entity.table),
            [],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection().map_err(|_| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: "Failed to get connection".to_string(),
            })
        })?;
        conn.query_row("SELECT 1", [], |_| Ok(())).map_err(|e| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: format!("Health check failed: {}", e),
            })
        })
    }
}
