use axum::extract::{rejection::JsonRejection, FromRequest};
use tracing::warn;

use crate::error::ApiError;

/// `axum::Json` whose rejections answer like every other client error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub const INVALID_BODY: &str = "Invalid request body";

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(status = %rejection.status(), reason = %rejection.body_text(), "request body rejected");
        ApiError::validation(INVALID_BODY)
    }
}
