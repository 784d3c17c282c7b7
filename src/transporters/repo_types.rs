use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Truck,
    Van,
    Trailer,
    Pickup,
    Container,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Truck => "truck",
            VehicleType::Van => "van",
            VehicleType::Trailer => "trailer",
            VehicleType::Pickup => "pickup",
            VehicleType::Container => "container",
        }
    }
}

impl FromStr for VehicleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "truck" => Ok(VehicleType::Truck),
            "van" => Ok(VehicleType::Van),
            "trailer" => Ok(VehicleType::Trailer),
            "pickup" => Ok(VehicleType::Pickup),
            "container" => Ok(VehicleType::Container),
            other => anyhow::bail!("unknown vehicle type `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransporterStatus {
    Active,
    Inactive,
}

impl TransporterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransporterStatus::Active => "active",
            TransporterStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for TransporterStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TransporterStatus::Active),
            "inactive" => Ok(TransporterStatus::Inactive),
            other => anyhow::bail!("unknown transporter status `{other}`"),
        }
    }
}

/// Row as stored in `transporters`.
#[derive(Debug, FromRow)]
pub struct TransporterRow {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub vehicle_type: String,
    pub capacity: i32,
    pub status: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transporter {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub vehicle_type: VehicleType,
    pub capacity: i32,
    pub status: TransporterStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<TransporterRow> for Transporter {
    type Error = anyhow::Error;

    fn try_from(r: TransporterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            contact: r.contact,
            vehicle_type: r.vehicle_type.parse()?,
            capacity: r.capacity,
            status: r.status.parse()?,
            created_at: r.created_at,
        })
    }
}

/// Validated input for an insert.
#[derive(Debug, Clone)]
pub struct NewTransporter {
    pub name: String,
    pub contact: String,
    pub vehicle_type: VehicleType,
    pub capacity: i32,
    pub status: TransporterStatus,
}
