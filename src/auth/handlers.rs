use axum::{http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::roles::{Identity, Role};
use crate::{error::ApiError, extract::ApiJson, state::AppState};

/// Routes open to any verified caller.
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user", get(current_user))
}

/// Routes that skip token verification entirely.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/auth/signup", post(signup))
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn current_user(caller: Identity) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        uid: caller.id,
        email: caller.email,
        role: caller.role,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
}

/// Demo endpoint kept for the public sign-up form. Accounts are only ever
/// provisioned by an admin through `POST /api/users`; this creates nothing.
#[instrument(skip_all)]
pub async fn signup(
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    info!(email = %body.email, "signup form submitted");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User signed up successfully",
            "user": { "email": body.email },
        })),
    ))
}
