//! Plates route configuration.
//!
//! Defines all routes for the plates REST API.

use axum::{
    Router,
    routing::{get, post},
};
use plates_persistence::domain::{
    Country, Department, Entity, Location, Note, Person, Plate, PlateHistory, Region,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the CRUD and search routes of one entity type.
///
/// # Routes
///
/// - `POST /api/{path}` - Create
/// - `PUT /api/{path}` - Update
/// - `GET /api/{path}` - List
/// - `GET /api/{path}/{id}` - Read
/// - `DELETE /api/{path}/{id}` - Delete
/// - `GET /api/_search/{path}` - Search
pub fn entity_routes<E: Entity>() -> Router<AppState> {
    let path = E::descriptor().path;
    Router::new()
        .route(
            &format!("/api/{}", path),
            get(handlers::list_handler::<E>)
                .post(handlers::create_handler::<E>)
                .put(handlers::update_handler::<E>),
        )
        .route(
            &format!("/api/{}/{{id}}", path),
            get(handlers::read_handler::<E>).delete(handlers::delete_handler::<E>),
        )
        .route(
            &format!("/api/_search/{}", path),
            get(handlers::search_handler::<E>),
        )
}

/// Creates all plates REST API routes.
///
/// # Routes
///
/// ## Entities
/// `regions`, `countries`, `locations`, `departments`, `people`, `plates`,
/// `notes` and `plate-histories`, each with the routes of [`entity_routes`].
///
/// ## Management
/// - `GET /management/health` - Backend health and divergence
/// - `POST /management/reindex` - Rebuild the search index
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .merge(entity_routes::<Region>())
        .merge(entity_routes::<Country>())
        .merge(entity_routes::<Location>())
        .merge(entity_routes::<Department>())
        .merge(entity_routes::<Person>())
        .merge(entity_routes::<Plate>())
        .merge(entity_routes::<Note>())
        .merge(entity_routes::<PlateHistory>())
        // Management routes
        .route("/management/health", get(handlers::health_handler))
        .route("/management/reindex", post(handlers::reindex_handler))
        // State
        .with_state(state)
}
