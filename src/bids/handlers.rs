use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{BidListResponse, BidResponse, CreateBidRequest, UpdateBidStatusRequest};
use crate::{auth::roles::Identity, error::ApiError, extract::ApiJson, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bids", get(list_bids).post(create_bid))
        .route("/bids/:id", delete(delete_bid))
        .route("/bids/:id/status", patch(update_bid_status))
}

#[instrument(skip(state))]
pub async fn list_bids(State(state): State<AppState>) -> Result<Json<BidListResponse>, ApiError> {
    let bids = state
        .db
        .list_bids()
        .await
        .map_err(|e| ApiError::dependency("Failed to fetch bids", e))?;
    Ok(Json(BidListResponse { bids, ok: true }))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn create_bid(
    State(state): State<AppState>,
    caller: Identity,
    ApiJson(body): ApiJson<CreateBidRequest>,
) -> Result<(StatusCode, Json<BidResponse>), ApiError> {
    let new = body.validate()?;
    let bid = state
        .db
        .create_bid(new)
        .await
        .map_err(|e| ApiError::dependency("Failed to create bid", e))?;

    info!(bid_id = %bid.id, material = %bid.material_type, "bid created");
    Ok((
        StatusCode::CREATED,
        Json(BidResponse {
            message: "Bid created successfully",
            bid,
        }),
    ))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn delete_bid(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .db
        .delete_bid(id)
        .await
        .map_err(|e| ApiError::dependency("Failed to delete bid", e))?;
    if !deleted {
        return Err(ApiError::NotFound("Bid not found"));
    }

    info!(bid_id = %id, "bid deleted");
    Ok(Json(json!({ "message": "Bid deleted successfully", "ok": true })))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn update_bid_status(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateBidStatusRequest>,
) -> Result<Json<BidResponse>, ApiError> {
    let id = parse_id(&id)?;
    let status = body.validate()?;
    let bid = state
        .db
        .update_bid_status(id, status)
        .await
        .map_err(|e| ApiError::dependency("Failed to update bid status", e))?
        .ok_or(ApiError::NotFound("Bid not found"))?;

    info!(bid_id = %id, status = status.as_str(), "bid status updated");
    Ok(Json(BidResponse {
        message: "Bid status updated successfully",
        bid,
    }))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::validation("Invalid bid id"))
}
