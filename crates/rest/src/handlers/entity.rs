//! Generic CRUD and search handlers.
//!
//! One set of handlers serves every entity type; the type parameter selects
//! the [`EntityService`](plates_persistence::EntityService) and the entity
//! name used in alerts and errors.

use axum::{
    Json,
    extract::{OriginalUri, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use plates_persistence::domain::{Entity, EntityId};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{EntityBody, PageQuery};
use crate::responses::{alert_headers, pagination_headers};
use crate::state::AppState;

fn entity_name<E: Entity>() -> &'static str {
    E::descriptor().name
}

/// Converts a storage error, naming the entity when the error does not.
fn storage_error<E: Entity>(err: plates_persistence::StorageError) -> RestError {
    RestError::from(err).for_entity(entity_name::<E>())
}

/// Handler for the create interaction.
///
/// # HTTP Request
///
/// `POST /api/[entities]`
///
/// # Response
///
/// - `201 Created` - Entity created, with `Location` and alert headers
/// - `400 Bad Request` - Body carries an id (`idexists`) or is invalid
pub async fn create_handler<E: Entity>(
    State(state): State<AppState>,
    EntityBody(entity): EntityBody<E>,
) -> RestResult<Response> {
    let name = entity_name::<E>();
    debug!(entity = name, "REST request to save {}", name);

    if entity.id().is_some() {
        return Err(RestError::bad_request(
            name,
            "idexists",
            format!("A new {} cannot already have an ID", name),
        ));
    }

    let saved = state
        .service::<E>()
        .save(entity)
        .await
        .map_err(storage_error::<E>)?;
    let id = saved.id().map(|id| id.to_string()).unwrap_or_default();

    let mut headers = alert_headers(state.app_name(), "created", name, &id);
    let location = format!("/api/{}/{}", E::descriptor().path, id);
    if let Ok(value) = location.parse() {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(saved)).into_response())
}

/// Handler for the update interaction.
///
/// # HTTP Request
///
/// `PUT /api/[entities]`
///
/// # Response
///
/// - `200 OK` - Entity updated, with alert headers
/// - `400 Bad Request` - Body has no id (`idnull`) or is invalid
/// - `404 Not Found` - No entity with that id
pub async fn update_handler<E: Entity>(
    State(state): State<AppState>,
    EntityBody(entity): EntityBody<E>,
) -> RestResult<Response> {
    let name = entity_name::<E>();
    debug!(entity = name, id = ?entity.id(), "REST request to update {}", name);

    let Some(id) = entity.id() else {
        return Err(RestError::bad_request(name, "idnull", "Invalid id"));
    };

    let saved = state
        .service::<E>()
        .save(entity)
        .await
        .map_err(storage_error::<E>)?;

    let headers = alert_headers(state.app_name(), "updated", name, &id.to_string());
    Ok((StatusCode::OK, headers, Json(saved)).into_response())
}

/// Handler for the paginated list interaction.
///
/// # HTTP Request
///
/// `GET /api/[entities]?page=&size=&sort=&eagerload=`
///
/// # Response
///
/// - `200 OK` - JSON array, with `X-Total-Count` and `Link` headers
/// - `400 Bad Request` - Invalid paging or sort parameters
pub async fn list_handler<E: Entity>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<PageQuery, RestError>,
) -> RestResult<Response> {
    let name = entity_name::<E>();
    let params = params.map_err(|e| e.for_entity(name))?;
    debug!(
        entity = name,
        page = params.page_request().page,
        size = params.page_request().size,
        eagerload = params.eagerload(),
        "REST request to get a page of {}",
        E::descriptor().path
    );

    let page = state
        .service::<E>()
        .find_all_paged(params.page_request(), params.eagerload())
        .await
        .map_err(storage_error::<E>)?;

    let headers = pagination_headers(state.base_url(), &uri, &page);
    Ok((StatusCode::OK, headers, Json(page.content)).into_response())
}

/// Handler for the read interaction.
///
/// Owned collections are always loaded.
///
/// # HTTP Request
///
/// `GET /api/[entities]/[id]`
///
/// # Response
///
/// - `200 OK` - Entity found
/// - `404 Not Found` - No entity with that id (empty body)
pub async fn read_handler<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> RestResult<Response> {
    let name = entity_name::<E>();
    debug!(entity = name, id, "REST request to get {}", name);

    match state
        .service::<E>()
        .find_one(id)
        .await
        .map_err(storage_error::<E>)?
    {
        Some(entity) => Ok((StatusCode::OK, Json(entity)).into_response()),
        None => Err(RestError::NotFound {
            entity: name.to_string(),
            id,
        }),
    }
}

/// Handler for the delete interaction.
///
/// Deleting an id that does not exist succeeds.
///
/// # HTTP Request
///
/// `DELETE /api/[entities]/[id]`
///
/// # Response
///
/// - `204 No Content` - Entity deleted (or never existed), with alert headers
pub async fn delete_handler<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> RestResult<Response> {
    let name = entity_name::<E>();
    debug!(entity = name, id, "REST request to delete {}", name);

    state
        .service::<E>()
        .delete(id)
        .await
        .map_err(storage_error::<E>)?;

    let headers = alert_headers(state.app_name(), "deleted", name, &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

/// Handler for the search interaction.
///
/// The query is forwarded to the search index unmodified.
///
/// # HTTP Request
///
/// `GET /api/_search/[entities]?query=&page=&size=&sort=`
///
/// # Response
///
/// - `200 OK` - JSON array, with `X-Total-Count` and `Link` headers
/// - `400 Bad Request` - Missing or unparseable query
pub async fn search_handler<E: Entity>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<PageQuery, RestError>,
) -> RestResult<Response> {
    let name = entity_name::<E>();
    let params = params.map_err(|e| e.for_entity(name))?;
    let Some(query) = params.query() else {
        return Err(RestError::bad_request(
            name,
            "querymissing",
            "Required parameter 'query' is not present",
        ));
    };
    debug!(entity = name, query, "REST request to search for a page of {}", E::descriptor().path);

    let page = state
        .service::<E>()
        .search(query, params.page_request())
        .await
        .map_err(storage_error::<E>)?;

    let headers = pagination_headers(state.base_url(), &uri, &page);
    Ok((StatusCode::OK, headers, Json(page.content)).into_response())
}
