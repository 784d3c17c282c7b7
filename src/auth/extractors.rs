use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::roles::Identity;
use crate::error::ApiError;

/// Hands the identity attached by `verify_token` to a handler.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiError::Unauthenticated(super::middleware::NO_TOKEN))
    }
}
