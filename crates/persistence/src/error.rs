//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates resource state errors, validation
//! errors, search errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur during persistence
/// operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search operation errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested entity was not found.
    #[error("entity not found: {entity}/{id}")]
    NotFound { entity: String, id: i64 },
}

/// Errors related to entity validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field was missing or null.
    #[error("missing required field: {entity}.{field}")]
    MissingRequiredField { entity: String, field: String },

    /// A field carried a value of the wrong shape.
    #[error("invalid value for {entity}.{field}: {message}")]
    InvalidField {
        entity: String,
        field: String,
        message: String,
    },

    /// A relational constraint (unique, foreign key, not null) was violated.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// A sort property that the entity does not have.
    #[error("unknown sort property '{property}' for {entity}")]
    InvalidSortProperty { entity: String, property: String },

    /// The entity type is not registered.
    #[error("unsupported entity type: {entity}")]
    UnsupportedEntity { entity: String },
}

/// Errors related to search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Search query parsing failed.
    #[error("failed to parse search query: {message}")]
    QueryParseError { message: String },

    /// Requested page lies beyond what the index can serve.
    #[error("search result window exceeded: offset {offset}, maximum is {max}")]
    ResultWindowExceeded { offset: u64, max: u64 },
}

/// Errors originating from the database or index backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl StorageError {
    /// Returns true if this error was caused by the caller's input rather than
    /// a backend fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(_) | StorageError::Validation(_) | StorageError::Search(_)
        )
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                return StorageError::Validation(ValidationError::ConstraintViolation {
                    message: message.clone().unwrap_or_else(|| failure.to_string()),
                });
            }
        }
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}
