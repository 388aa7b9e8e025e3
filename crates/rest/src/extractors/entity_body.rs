//! Entity body extractor.
//!
//! Deserializes a JSON request body into an entity.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use plates_persistence::domain::Entity;

use crate::error::RestError;

/// Axum extractor for an entity in the request body.
///
/// Rejects with a 400 problem naming the entity when the content type is
/// not JSON or the body does not deserialize into `E`.
///
/// # Example
///
/// ```rust,ignore
/// use plates_persistence::domain::Plate;
/// use plates_rest::extractors::EntityBody;
///
/// async fn create_handler(EntityBody(plate): EntityBody<Plate>) {
///     println!("Creating: {:?}", plate.plate_title);
/// }
/// ```
#[derive(Debug)]
pub struct EntityBody<E>(pub E);

impl<E: Entity> EntityBody<E> {
    /// Consumes the extractor and returns the entity.
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<S, E> FromRequest<S> for EntityBody<E>
where
    S: Send + Sync,
    E: Entity,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let entity = E::descriptor().name;

        // Check content type (must own the string before moving req)
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        if !content_type.contains("json") {
            return Err(RestError::bad_request(
                entity,
                "unsupportedmediatype",
                format!("Content type '{}' is not supported", content_type),
            ));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            RestError::bad_request(entity, "invalidbody", format!("Invalid body: {}", e))
        })?;

        let value = serde_json::from_slice(&bytes).map_err(|e| {
            RestError::bad_request(entity, "invalidbody", format!("Invalid JSON: {}", e))
        })?;
        Ok(EntityBody(value))
    }
}
