use serde::{Deserialize, Serialize};

use super::repo_types::{NewTransporter, Transporter};
use crate::{
    error::ApiError,
    validate::{non_empty, positive_int, present},
};

/// Body of `POST /api/transporters`. Every field is optional at the serde
/// level so that missing fields become a 400 instead of a JSON rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransporterRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub vehicle_type: Option<String>,
    /// Forms submit this as a string, API clients as a number.
    pub capacity: Option<serde_json::Value>,
    pub status: Option<String>,
}

impl CreateTransporterRequest {
    pub fn validate(self) -> Result<NewTransporter, ApiError> {
        let (Some(name), Some(contact), Some(vehicle_type), Some(capacity), Some(status)) = (
            non_empty(self.name),
            non_empty(self.contact),
            non_empty(self.vehicle_type),
            present(self.capacity),
            non_empty(self.status),
        ) else {
            return Err(ApiError::validation("All fields are required"));
        };

        Ok(NewTransporter {
            name,
            contact,
            vehicle_type: vehicle_type
                .parse()
                .map_err(|_| ApiError::validation("Invalid vehicle type"))?,
            capacity: positive_int(&capacity)
                .ok_or_else(|| ApiError::validation("Invalid capacity"))?,
            status: status
                .parse()
                .map_err(|_| ApiError::validation("Invalid status"))?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TransporterListResponse {
    pub transporters: Vec<Transporter>,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct TransporterCreatedResponse {
    pub message: &'static str,
    pub transporter: Transporter,
}
