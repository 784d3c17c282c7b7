use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateTransporterRequest, TransporterCreatedResponse, TransporterListResponse};
use crate::{auth::roles::Identity, error::ApiError, extract::ApiJson, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/transporters", get(list_transporters))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/transporters", post(create_transporter))
        .route("/transporters/:id", delete(delete_transporter))
}

#[instrument(skip(state))]
pub async fn list_transporters(
    State(state): State<AppState>,
) -> Result<Json<TransporterListResponse>, ApiError> {
    let transporters = state
        .db
        .list_transporters()
        .await
        .map_err(|e| ApiError::dependency("Failed to fetch transporters", e))?;
    Ok(Json(TransporterListResponse {
        transporters,
        ok: true,
    }))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn create_transporter(
    State(state): State<AppState>,
    caller: Identity,
    ApiJson(body): ApiJson<CreateTransporterRequest>,
) -> Result<(StatusCode, Json<TransporterCreatedResponse>), ApiError> {
    let new = body.validate()?;
    let transporter = state
        .db
        .create_transporter(new)
        .await
        .map_err(|e| ApiError::dependency("Failed to create transporter", e))?;

    info!(transporter_id = %transporter.id, name = %transporter.name, "transporter created");
    Ok((
        StatusCode::CREATED,
        Json(TransporterCreatedResponse {
            message: "Transporter created successfully",
            transporter,
        }),
    ))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn delete_transporter(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: Uuid = id
        .parse()
        .map_err(|_| ApiError::validation("Invalid transporter id"))?;

    let deleted = state
        .db
        .delete_transporter(id)
        .await
        .map_err(|e| ApiError::dependency("Failed to delete transporter", e))?;
    if !deleted {
        return Err(ApiError::NotFound("Transporter not found"));
    }

    info!(transporter_id = %id, "transporter deleted");
    Ok(Json(json!({ "message": "Transporter deleted successfully", "ok": true })))
}
