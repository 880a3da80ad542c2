use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Car {
    pub id: Uuid,
    pub plate_no: String,
    pub driver_name: String,
    pub phone_no: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejects values that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Canonical form of a plate number: surrounding whitespace removed, upper-case.
pub fn normalize_plate(plate_no: &str) -> String {
    plate_no.trim().to_uppercase()
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "plateNo is required"))]
    pub plate_no: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "driverName is required"))]
    pub driver_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "phoneNo is required"))]
    pub phone_no: String,
}

/// Only the driver details of a car are mutable; the plate is its identity.
#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarUpdateRequest {
    #[validate(custom(function = "validate_not_blank", message = "driverName must not be empty"))]
    pub driver_name: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "phoneNo must not be empty"))]
    pub phone_no: Option<String>,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    pub id: Uuid,
    pub plate_no: String,
    pub driver_name: String,
    pub phone_no: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Car> for CarResponse {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            plate_no: car.plate_no.clone(),
            driver_name: car.driver_name.clone(),
            phone_no: car.phone_no.clone(),
            created_at: car.created_at,
            updated_at: car.updated_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarSummaryResponse {
    pub id: Uuid,
    pub plate_no: String,
    pub driver_name: String,
    pub phone_no: String,
}

impl From<&Car> for CarSummaryResponse {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            plate_no: car.plate_no.clone(),
            driver_name: car.driver_name.clone(),
            phone_no: car.phone_no.clone(),
        }
    }
}
