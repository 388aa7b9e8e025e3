//! Management endpoint handlers.
//!
//! Health reporting for monitoring and load balancers, and index rebuilds.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plates_persistence::ReindexRequest;
use plates_persistence::composite::HealthStatus;
use tracing::{debug, info};

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Probes both backends and reports their health together with the number
/// of documents known to differ between them.
///
/// # HTTP Request
///
/// `GET /management/health`
///
/// # Response
///
/// - `200 OK` - Status `UP` or `DEGRADED`
/// - `503 Service Unavailable` - The primary store is down
pub async fn health_handler(State(state): State<AppState>) -> Response {
    debug!("Processing health check request");

    let report = state.monitor().check(state.store(), state.index()).await;
    let status = match report.status {
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Up | HealthStatus::Degraded => StatusCode::OK,
    };

    (status, Json(report)).into_response()
}

/// Handler for the reindex endpoint.
///
/// Rebuilds index collections from the primary store. The body is an
/// optional JSON [`ReindexRequest`]; without one every entity type is
/// rebuilt.
///
/// # HTTP Request
///
/// `POST /management/reindex`
///
/// # Response
///
/// - `200 OK` - Reindex report
/// - `400 Bad Request` - Malformed request, unknown entity type or zero batch size
pub async fn reindex_handler(State(state): State<AppState>, body: Bytes) -> RestResult<Response> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ReindexRequest::default()
    } else {
        serde_json::from_slice::<ReindexRequest>(&body).map_err(|e| {
            RestError::bad_request("reindex", "invalidbody", format!("Invalid JSON: {}", e))
        })?
    };
    info!(
        entity_types = ?request.entity_types,
        batch_size = request.batch_size,
        clear_existing = request.clear_existing,
        "Reindex requested"
    );

    let report = state
        .reindexer()
        .reindex(&request)
        .await
        .map_err(|e| RestError::from(e).for_entity("reindex"))?;

    Ok((StatusCode::OK, Json(report)).into_response())
}
