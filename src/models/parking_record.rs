use crate::models::car::{Car, CarSummaryResponse, validate_not_blank};
use crate::models::slot::{ParkingSlot, SlotSummaryResponse};
use chrono::{DateTime, Utc};
use rocket::{FromForm, FromFormField};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a parking session: `parked -> exited_unpaid -> paid`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Default, JsonSchema, FromFormField)]
#[serde(rename_all = "snake_case")]
pub enum ParkingStatus {
    #[default]
    #[field(value = "parked")]
    Parked,
    #[field(value = "exited_unpaid")]
    ExitedUnpaid,
    #[field(value = "paid")]
    Paid,
}

impl ParkingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParkingStatus::Parked => "parked",
            ParkingStatus::ExitedUnpaid => "exited_unpaid",
            ParkingStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for ParkingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParkingRecord {
    pub id: Uuid,
    pub car: Car,
    pub slot: ParkingSlot,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub parking_fee: Option<i64>,
    pub status: ParkingStatus,
}

/// Values written to a record when its car leaves.
#[derive(Debug, Clone, Copy)]
pub struct ExitDetails {
    pub exit_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub parking_fee: i64,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub car_id: Option<Uuid>,
    pub status: Option<ParkingStatus>,
}

/// Query string of the history listing: `?plateNo=..&status=..`.
#[derive(FromForm, Deserialize, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[field(name = "plateNo")]
    pub plate_no: Option<String>,
    pub status: Option<ParkingStatus>,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "plateNo is required"))]
    pub plate_no: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "driverName is required"))]
    pub driver_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "phoneNo is required"))]
    pub phone_no: String,
    pub slot_no: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "plateNo is required"))]
    pub plate_no: String,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParkingRecordResponse {
    pub id: Uuid,
    pub car: CarSummaryResponse,
    pub slot: SlotSummaryResponse,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub parking_fee: Option<i64>,
    pub status: ParkingStatus,
}

impl From<&ParkingRecord> for ParkingRecordResponse {
    fn from(record: &ParkingRecord) -> Self {
        Self {
            id: record.id,
            car: CarSummaryResponse::from(&record.car),
            slot: SlotSummaryResponse::from(&record.slot),
            entry_time: record.entry_time,
            exit_time: record.exit_time,
            duration: record.duration_minutes,
            parking_fee: record.parking_fee,
            status: record.status,
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParkingEventResponse {
    pub msg: String,
    pub parking_record: ParkingRecordResponse,
}
