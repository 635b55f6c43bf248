//! Caller identity extraction.
//!
//! Authentication and authorization live in an upstream collaborator;
//! by the time a request reaches this service the verified account id is
//! carried in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated account on whose behalf the request runs.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let uuid = Uuid::parse_str(header).map_err(|_| ApiError::Unauthorized)?;
        Ok(Caller(UserId::from_uuid(uuid)))
    }
}
