use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::repo_types::{Bid, BidStatus, NewBid};
use crate::{
    error::ApiError,
    validate::{non_empty, positive_int, present},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidRequest {
    pub material_type: Option<String>,
    pub quantity: Option<serde_json::Value>,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub deadline: Option<String>,
    pub transporter_requirements: Option<String>,
    pub status: Option<String>,
}

impl CreateBidRequest {
    pub fn validate(self) -> Result<NewBid, ApiError> {
        let (Some(material_type), Some(quantity), Some(pickup_location), Some(delivery_location), Some(deadline)) = (
            non_empty(self.material_type),
            present(self.quantity),
            non_empty(self.pickup_location),
            non_empty(self.delivery_location),
            non_empty(self.deadline),
        ) else {
            return Err(ApiError::validation("Missing required fields"));
        };

        let status = match non_empty(self.status) {
            Some(s) => parse_status(&s)?,
            None => BidStatus::default(),
        };

        Ok(NewBid {
            material_type,
            quantity: positive_int(&quantity)
                .ok_or_else(|| ApiError::validation("Invalid quantity"))?,
            pickup_location,
            delivery_location,
            deadline: OffsetDateTime::parse(&deadline, &Rfc3339)
                .map_err(|_| ApiError::validation("Invalid deadline"))?,
            transporter_requirements: self
                .transporter_requirements
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBidStatusRequest {
    pub status: Option<String>,
}

impl UpdateBidStatusRequest {
    pub fn validate(self) -> Result<BidStatus, ApiError> {
        let status = non_empty(self.status).ok_or_else(|| ApiError::validation("Status is required"))?;
        parse_status(&status)
    }
}

fn parse_status(s: &str) -> Result<BidStatus, ApiError> {
    s.parse().map_err(|_| ApiError::validation("Invalid status"))
}

#[derive(Debug, Serialize)]
pub struct BidListResponse {
    pub bids: Vec<Bid>,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub message: &'static str,
    pub bid: Bid,
}
