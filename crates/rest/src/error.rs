//! Error types for the plates REST API.
//!
//! Errors are rendered as `application/problem+json` bodies carrying the
//! entity name and an error key, except for not-found which has an empty
//! body and no alert. Other error responses carry an [`ErrorAlert`] extension from
//! which the alert middleware builds the `X-<app>-error` and `X-<app>-params`
//! headers.
//!
//! # Error Mapping
//!
//! | Storage Error | HTTP Status | Error Key |
//! |--------------|-------------|-----------|
//! | NotFound | 404 | (empty body) |
//! | MissingRequiredField | 400 | required |
//! | InvalidField | 400 | invalidfield |
//! | ConstraintViolation | 400 | constraintviolation |
//! | InvalidSortProperty | 400 | invalidsort |
//! | UnsupportedEntity | 400 | unsupportedentity |
//! | QueryParseError | 400 | invalidquery |
//! | ResultWindowExceeded | 400 | resultwindow |
//! | BackendError | 500 | http.500 |

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use plates_persistence::error::{
    BackendError, ResourceError, SearchError, StorageError, ValidationError,
};
use serde_json::json;
use std::fmt;
use tracing::error;

/// Problem type URI of errors carrying a message key.
pub const PROBLEM_WITH_MESSAGE: &str = "https://www.jhipster.tech/problem/problem-with-message";

/// Content type of error bodies.
pub const PROBLEM_JSON: &str = "application/problem+json";

/// The primary error type for REST API operations.
#[derive(Debug)]
pub enum RestError {
    /// Invalid request (HTTP 400).
    BadRequest {
        /// Entity name the request was about.
        entity: String,
        /// Machine-readable key, rendered as `error.<key>`.
        error_key: String,
        /// Human-readable message.
        message: String,
    },

    /// No row with the requested id (HTTP 404, empty body).
    NotFound {
        /// Entity name.
        entity: String,
        /// Requested id.
        id: i64,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Creates a 400 error.
    pub fn bad_request(
        entity: impl Into<String>,
        error_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RestError::BadRequest {
            entity: entity.into(),
            error_key: error_key.into(),
            message: message.into(),
        }
    }

    /// Fills in the entity name of a 400 error that has none.
    pub fn for_entity(self, name: &str) -> Self {
        match self {
            RestError::BadRequest {
                entity,
                error_key,
                message,
            } if entity.is_empty() => RestError::BadRequest {
                entity: name.to_string(),
                error_key,
                message,
            },
            other => other,
        }
    }

    /// Returns the HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message, .. } => {
                write!(f, "Bad request: {}", message)
            }
            RestError::NotFound { entity, id } => {
                write!(f, "Entity not found: {}/{}", entity, id)
            }
            RestError::InternalError { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RestError {}

/// Alert data attached to error responses as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAlert {
    /// Entity name, sent in the params header.
    pub entity: String,
    /// Error key, sent as `error.<key>`.
    pub error_key: String,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (entity, error_key, title, message) = match self {
            RestError::NotFound { entity, id } => {
                tracing::debug!(entity = %entity, id, "Entity not found");
                return status.into_response();
            }
            RestError::BadRequest {
                entity,
                error_key,
                message,
            } => (entity, error_key, message, None),
            RestError::InternalError { message } => {
                error!(error = %message, "Request failed");
                (
                    String::new(),
                    "http.500".to_string(),
                    "Internal Server Error".to_string(),
                    Some(message),
                )
            }
        };

        let body = create_problem(status, &entity, &error_key, &title, message.as_deref());
        let mut response = (
            status,
            [(header::CONTENT_TYPE, PROBLEM_JSON)],
            Json(body),
        )
            .into_response();
        response
            .extensions_mut()
            .insert(ErrorAlert { entity, error_key });
        response
    }
}

/// Creates a problem body.
///
/// # Arguments
///
/// * `status` - HTTP status
/// * `entity` - Entity name, echoed in `entityName` and `params`
/// * `error_key` - Key rendered as `error.<key>`
/// * `title` - Human-readable title
/// * `detail` - Optional detail message
fn create_problem(
    status: StatusCode,
    entity: &str,
    error_key: &str,
    title: &str,
    detail: Option<&str>,
) -> serde_json::Value {
    let mut problem = json!({
        "type": PROBLEM_WITH_MESSAGE,
        "title": title,
        "status": status.as_u16(),
        "message": format!("error.{}", error_key),
        "errorKey": error_key,
        "entityName": entity,
        "params": entity,
    });
    if let Some(detail) = detail {
        problem["detail"] = json!(detail);
    }
    problem
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Validation(e) => e.into(),
            StorageError::Search(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { entity, id } => RestError::NotFound { entity, id },
        }
    }
}

impl From<ValidationError> for RestError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::MissingRequiredField { entity, .. } => {
                RestError::bad_request(entity, "required", message)
            }
            ValidationError::InvalidField { entity, .. } => {
                RestError::bad_request(entity, "invalidfield", message)
            }
            ValidationError::ConstraintViolation { .. } => {
                RestError::bad_request("", "constraintviolation", message)
            }
            ValidationError::InvalidSortProperty { entity, .. } => {
                RestError::bad_request(entity, "invalidsort", message)
            }
            ValidationError::UnsupportedEntity { entity } => {
                RestError::bad_request(entity, "unsupportedentity", message)
            }
        }
    }
}

impl From<SearchError> for RestError {
    fn from(err: SearchError) -> Self {
        let key = match err {
            SearchError::QueryParseError { .. } => "invalidquery",
            SearchError::ResultWindowExceeded { .. } => "resultwindow",
        };
        RestError::bad_request("", key, err.to_string())
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        RestError::InternalError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = RestError::NotFound {
            entity: "plate".to_string(),
            id: 123,
        };
        assert_eq!(err.to_string(), "Entity not found: plate/123");
    }

    #[test]
    fn test_create_problem() {
        let problem = create_problem(
            StatusCode::BAD_REQUEST,
            "plate",
            "idexists",
            "A new plate cannot already have an ID",
            None,
        );
        assert_eq!(problem["status"], 400);
        assert_eq!(problem["entityName"], "plate");
        assert_eq!(problem["errorKey"], "idexists");
        assert_eq!(problem["message"], "error.idexists");
        assert_eq!(problem["params"], "plate");
        assert!(problem.get("detail").is_none());
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: RestError = StorageError::Validation(ValidationError::MissingRequiredField {
            entity: "department".to_string(),
            field: "departmentName".to_string(),
        })
        .into();
        assert!(matches!(
            err,
            RestError::BadRequest { ref entity, ref error_key, .. }
                if entity == "department" && error_key == "required"
        ));

        let err: RestError = StorageError::Resource(ResourceError::NotFound {
            entity: "note".to_string(),
            id: 4,
        })
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: RestError = StorageError::Search(SearchError::QueryParseError {
            message: "unbalanced".to_string(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: RestError = StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_response_has_empty_body() {
        let response = RestError::NotFound {
            entity: "plate".to_string(),
            id: 1,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(response.extensions().get::<ErrorAlert>().is_none());
    }

    #[test]
    fn test_bad_request_response() {
        let response = RestError::bad_request("plate", "idnull", "Invalid id").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);
        assert_eq!(
            response.extensions().get::<ErrorAlert>(),
            Some(&ErrorAlert {
                entity: "plate".to_string(),
                error_key: "idnull".to_string(),
            })
        );
    }
}
