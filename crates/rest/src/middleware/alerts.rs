//! Failure alert headers.
//!
//! Error responses carry an [`ErrorAlert`] extension. This middleware turns
//! it into `X-<app>-error` and `X-<app>-params` headers, using the
//! application name from the configuration.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ErrorAlert;
use crate::responses::failure_headers;
use crate::state::AppState;

/// Middleware function adding failure alert headers.
///
/// This can be used with `axum::middleware::from_fn_with_state`.
pub async fn error_alert_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Some(alert) = response.extensions_mut().remove::<ErrorAlert>() {
        debug!(
            error_key = %alert.error_key,
            entity = %alert.entity,
            status = response.status().as_u16(),
            "Request failed"
        );
        let headers = failure_headers(state.app_name(), &alert.error_key, &alert.entity);
        response.headers_mut().extend(headers);
    }

    response
}
