use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Failures a handler or middleware can turn into an HTTP response.
///
/// The message of every variant is what the client sees in `{"error": ...}`,
/// so dependency failures carry only a generic text; the cause is logged where
/// the error is created.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BusinessRule(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Dependency(&'static str),
    #[error("Request timed out")]
    Timeout,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Logs `cause` and hides it behind `public`.
    pub fn dependency<E: std::fmt::Display>(public: &'static str, cause: E) -> Self {
        error!(error = %cause, "{public}");
        Self::Dependency(public)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::BusinessRule(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
