use crate::models::parking_record::{ParkingRecord, ParkingStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub parking_record_id: Uuid,
    pub amount_paid: i64,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentWithRecord {
    pub payment: Payment,
    pub parking_record: ParkingRecord,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[validate(required(message = "parkingRecordId is required"))]
    pub parking_record_id: Option<Uuid>,
    /// Whole currency units. Fractional amounts such as `10.5` are rejected.
    #[validate(required(message = "amountPaid is required"), range(min = 0, message = "amountPaid must not be negative"))]
    pub amount_paid: Option<i64>,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub parking_record_id: Uuid,
    pub amount_paid: i64,
    pub payment_date: DateTime<Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            parking_record_id: payment.parking_record_id,
            amount_paid: payment.amount_paid,
            payment_date: payment.payment_date,
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaidRecordSummaryResponse {
    pub id: Uuid,
    pub plate_no: String,
    pub slot_no: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub parking_fee: Option<i64>,
    pub status: ParkingStatus,
}

impl From<&ParkingRecord> for PaidRecordSummaryResponse {
    fn from(record: &ParkingRecord) -> Self {
        Self {
            id: record.id,
            plate_no: record.car.plate_no.clone(),
            slot_no: record.slot.slot_no.clone(),
            entry_time: record.entry_time,
            exit_time: record.exit_time,
            parking_fee: record.parking_fee,
            status: record.status,
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailResponse {
    pub id: Uuid,
    pub parking_record: PaidRecordSummaryResponse,
    pub amount_paid: i64,
    pub payment_date: DateTime<Utc>,
}

impl From<&PaymentWithRecord> for PaymentDetailResponse {
    fn from(value: &PaymentWithRecord) -> Self {
        Self {
            id: value.payment.id,
            parking_record: PaidRecordSummaryResponse::from(&value.parking_record),
            amount_paid: value.payment.amount_paid,
            payment_date: value.payment.payment_date,
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecordedResponse {
    pub msg: String,
    pub payment: PaymentResponse,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenueResponse {
    /// Calendar day in `YYYY-MM-DD` form.
    pub date: String,
    pub total_revenue: i64,
}

impl DailyRevenueResponse {
    pub fn new(date: NaiveDate, total_revenue: i64) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            total_revenue,
        }
    }
}
