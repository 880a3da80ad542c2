use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Occupied => "occupied",
            SlotStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParkingSlot {
    pub id: Uuid,
    pub slot_no: String,
    pub slot_status: SlotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn normalize_slot_no(slot_no: &str) -> String {
    slot_no.trim().to_uppercase()
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotSpec {
    #[serde(default)]
    pub slot_no: String,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
pub struct BulkSlotRequest {
    #[validate(length(min = 1, message = "Please provide an array of slots"))]
    pub slots: Vec<SlotSpec>,
}

#[derive(Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotStatusRequest {
    pub slot_status: SlotStatus,
}

#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlotCreationStatus {
    Created,
    Skipped,
}

/// Outcome of one entry in a bulk slot creation request.
#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotCreationResult {
    pub slot_no: String,
    pub status: SlotCreationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SlotCreationResult {
    pub fn created(slot: &ParkingSlot) -> Self {
        Self {
            slot_no: slot.slot_no.clone(),
            status: SlotCreationStatus::Created,
            id: Some(slot.id),
            reason: None,
        }
    }

    pub fn skipped(slot_no: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            slot_no: slot_no.into(),
            status: SlotCreationStatus::Skipped,
            id: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: Uuid,
    pub slot_no: String,
    pub slot_status: SlotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ParkingSlot> for SlotResponse {
    fn from(slot: &ParkingSlot) -> Self {
        Self {
            id: slot.id,
            slot_no: slot.slot_no.clone(),
            slot_status: slot.slot_status,
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotSummaryResponse {
    pub id: Uuid,
    pub slot_no: String,
    pub slot_status: SlotStatus,
}

impl From<&ParkingSlot> for SlotSummaryResponse {
    fn from(slot: &ParkingSlot) -> Self {
        Self {
            id: slot.id,
            slot_no: slot.slot_no.clone(),
            slot_status: slot.slot_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_request_needs_at_least_one_slot() {
        let empty: BulkSlotRequest = serde_json::from_str(r#"{"slots":[]}"#).unwrap();
        assert!(empty.validate().unwrap_err().field_errors().contains_key("slots"));

        let one: BulkSlotRequest = serde_json::from_str(r#"{"slots":[{"slotNo":"A1"}]}"#).unwrap();
        assert!(one.validate().is_ok());
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&SlotStatus::Occupied).unwrap();
        assert_eq!(json, r#""occupied""#);
        let parsed: SlotStatusRequest = serde_json::from_str(r#"{"slotStatus":"reserved"}"#).unwrap();
        assert_eq!(parsed.slot_status, SlotStatus::Reserved);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<SlotStatusRequest>(r#"{"slotStatus":"broken"}"#).is_err());
    }

    #[test]
    fn skipped_results_omit_id() {
        let json = serde_json::to_value(SlotCreationResult::skipped("A1", "already exists")).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("id").is_none());
        assert_eq!(json["reason"], "already exists");
    }
}
