//! # plates-rest - REST API for the plates service
//!
//! This crate exposes the plates entities over HTTP: create, update, list,
//! read, delete and free-text search for every entity type, plus health and
//! reindex management endpoints.
//!
//! ## Features
//!
//! - **Generic CRUD**: one set of handlers serves every entity type
//! - **Pagination**: `page`/`size`/`sort` parameters with `X-Total-Count` and
//!   `Link` response headers
//! - **Search**: query-string search against the search index
//! - **Alerts**: `X-<app>-alert`, `X-<app>-error` and `X-<app>-params` headers
//!   describing what happened
//!
//! ## Backend Support
//!
//! Storage backends are configured through feature flags:
//!
//! - `sqlite` - SQLite primary store (default)
//! - `elasticsearch` - Elasticsearch search index
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use plates_persistence::backends::memory::MemoryIndex;
//! use plates_persistence::backends::sqlite::SqliteBackend;
//! use plates_rest::{ServerConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Create the primary store and the search index
//!     let backend = SqliteBackend::open("plates.db")?;
//!     backend.init_schema()?;
//!     let index = MemoryIndex::new();
//!
//!     // Create the Axum application
//!     let app = create_app_with_config(Arc::new(backend), Arc::new(index), ServerConfig::default());
//!
//!     // Start the server
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | create | POST | `/api/[entities]` |
//! | update | PUT | `/api/[entities]` |
//! | list | GET | `/api/[entities]?page=&size=&sort=&eagerload=` |
//! | read | GET | `/api/[entities]/[id]` |
//! | delete | DELETE | `/api/[entities]/[id]` |
//! | search | GET | `/api/_search/[entities]?query=` |
//! | health | GET | `/management/health` |
//! | reindex | POST | `/management/reindex` |
//!
//! ## Error Handling
//!
//! Errors are returned as `application/problem+json` with appropriate HTTP
//! status codes:
//!
//! | HTTP Status | Description |
//! |-------------|-------------|
//! | 400 | Invalid body, id rules, parameters or constraints |
//! | 404 | Entity not found (empty body) |
//! | 500 | Backend failure |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and problem responses
//! - [`config`] - Server configuration
//! - [`state`] - Application state (backends, monitor, configuration)
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Axum middleware (failure alerts)
//! - [`extractors`] - Axum extractors for bodies and paging
//! - [`responses`] - Alert and pagination header generation
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::{SearchBackend, ServerConfig};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, http::StatusCode};
use plates_persistence::{PrimaryStore, SearchIndex};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// This is a convenience function that creates the app with default settings.
/// For more control, use [`create_app_with_config`].
pub fn create_app(store: Arc<dyn PrimaryStore>, index: Arc<dyn SearchIndex>) -> Router {
    create_app_with_config(store, index, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// This function sets up the complete REST API with all handlers,
/// middleware, and configuration.
///
/// # Arguments
///
/// * `store` - The primary store, usually wrapped in a
///   [`CachedStore`](plates_persistence::CachedStore)
/// * `index` - The search index
/// * `config` - Server configuration
///
/// # Example
///
/// ```rust,ignore
/// use plates_rest::{create_app_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     port: 3000,
///     enable_cors: true,
///     ..Default::default()
/// };
/// let app = create_app_with_config(store, index, config);
/// ```
pub fn create_app_with_config(
    store: Arc<dyn PrimaryStore>,
    index: Arc<dyn SearchIndex>,
    config: ServerConfig,
) -> Router {
    info!(
        store = store.backend_name(),
        index = index.backend_name(),
        "Creating REST API server"
    );

    // Create application state
    let state = AppState::new(store, index, config.clone());

    // Build the router with all routes
    let router = routing::create_routes(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::error_alert_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.max_body_size));

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    // Add request IDs if enabled
    let router = if config.enable_request_id {
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    } else {
        router
    };

    // Apply remaining middleware
    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    // Configure origins
    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    // Configure methods
    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    // Configure headers
    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    // Let browsers read the alert and paging headers
    let app = config.app_name.as_str();
    let exposed: Vec<axum::http::HeaderName> = [
        responses::headers::alert_header(app),
        responses::headers::error_header(app),
        responses::headers::params_header(app),
        responses::headers::TOTAL_COUNT.to_string(),
        "link".to_string(),
    ]
    .iter()
    .filter_map(|s| s.parse().ok())
    .collect();
    cors.expose_headers(exposed)
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "plates_rest={level},plates_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
