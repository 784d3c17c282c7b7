use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BidStatus {
    #[default]
    Open,
    InProgress,
    Closed,
    Expired,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Open => "open",
            BidStatus::InProgress => "in-progress",
            BidStatus::Closed => "closed",
            BidStatus::Expired => "expired",
        }
    }
}

impl FromStr for BidStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(BidStatus::Open),
            "in-progress" => Ok(BidStatus::InProgress),
            "closed" => Ok(BidStatus::Closed),
            "expired" => Ok(BidStatus::Expired),
            other => anyhow::bail!("unknown bid status `{other}`"),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BidRow {
    pub id: Uuid,
    pub material_type: String,
    pub quantity: i32,
    pub pickup_location: String,
    pub delivery_location: String,
    pub deadline: OffsetDateTime,
    pub transporter_requirements: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub material_type: String,
    pub quantity: i32,
    pub pickup_location: String,
    pub delivery_location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    pub transporter_requirements: String,
    pub status: BidStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<BidRow> for Bid {
    type Error = anyhow::Error;

    fn try_from(r: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            material_type: r.material_type,
            quantity: r.quantity,
            pickup_location: r.pickup_location,
            delivery_location: r.delivery_location,
            deadline: r.deadline,
            transporter_requirements: r.transporter_requirements,
            status: r.status.parse()?,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewBid {
    pub material_type: String,
    pub quantity: i32,
    pub pickup_location: String,
    pub delivery_location: String,
    pub deadline: OffsetDateTime,
    pub transporter_requirements: String,
    pub status: BidStatus,
}
