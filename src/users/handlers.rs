use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{
    dto::{
        CreateUserRequest, ResetLinkResponse, UpdateRoleRequest, UserCreatedResponse,
        UserListResponse,
    },
    services::create_account,
};
use crate::{
    auth::{
        middleware::authorize,
        roles::{Identity, ADMIN_ONLY},
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:uid/role", put(update_role))
        .route("/users/:uid/reset-password", post(reset_password))
}

/// Deletion checks the self-deletion rule before the role, so any signed-in
/// caller targeting their own account gets the same answer.
pub fn delete_routes() -> Router<AppState> {
    Router::new().route("/users/:uid", delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, ApiError> {
    let users = state
        .db
        .list_users()
        .await
        .map_err(|e| ApiError::dependency("Failed to fetch users", e))?;
    Ok(Json(UserListResponse { users, ok: true }))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn create_user(
    State(state): State<AppState>,
    caller: Identity,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let valid = body.validate()?;

    let user = create_account(
        state.identity.as_ref(),
        state.db.as_ref(),
        &valid.email,
        &valid.password,
        valid.role,
    )
    .await
    .map_err(|e| ApiError::dependency("Failed to create user", format!("{e:#}")))?;

    info!(uid = %user.id, email = %user.email, role = %user.role, "user created");
    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            uid: user.id,
            email: user.email,
            role: user.role,
            message: "User created successfully",
        }),
    ))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: Identity,
    Path(uid): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if uid == caller.id {
        warn!("refusing self-deletion");
        return Err(ApiError::BusinessRule("Cannot delete your own account"));
    }
    authorize(&caller, ADMIN_ONLY).map_err(|e| {
        warn!(role = %caller.role, "role not permitted to delete users");
        e
    })?;

    state
        .identity
        .delete_user(&uid)
        .await
        .map_err(|e| ApiError::dependency("Failed to delete user", e))?;

    let had_row = state
        .db
        .delete_user(&uid)
        .await
        .map_err(|e| ApiError::dependency("Failed to delete user", e))?;
    if !had_row {
        warn!(uid = %uid, "deleted provider account had no local row");
    }

    info!(uid = %uid, "user deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn update_role(
    State(state): State<AppState>,
    caller: Identity,
    Path(uid): Path<String>,
    ApiJson(body): ApiJson<UpdateRoleRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let role = body.validate()?;

    state
        .identity
        .set_role_claim(&uid, role)
        .await
        .map_err(|e| ApiError::dependency("Failed to update user role", e))?;

    let had_row = state
        .db
        .update_user_role(&uid, role)
        .await
        .map_err(|e| ApiError::dependency("Failed to update user role", e))?;
    if !had_row {
        warn!(uid = %uid, "role claim updated for account with no local row");
    }

    info!(uid = %uid, role = %role, "user role updated");
    Ok(Json(json!({ "message": "User role updated successfully" })))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn reset_password(
    State(state): State<AppState>,
    caller: Identity,
    Path(uid): Path<String>,
) -> Result<Json<ResetLinkResponse>, ApiError> {
    const FAILED: &str = "Failed to generate password reset link";

    let account = state
        .identity
        .get_user(&uid)
        .await
        .map_err(|e| ApiError::dependency(FAILED, e))?;
    let reset_link = state
        .identity
        .password_reset_link(&account.email)
        .await
        .map_err(|e| ApiError::dependency(FAILED, e))?;

    info!(uid = %uid, "password reset link generated");
    Ok(Json(ResetLinkResponse {
        message: "Password reset link generated",
        reset_link,
    }))
}
