use crate::database::parking_record::ParkingRecordRepository;
use crate::database::payment::PaymentRepository;
use crate::error::app_error::AppError;
use crate::models::parking_record::ParkingStatus;
use crate::models::payment::{Payment, PaymentRequest, PaymentWithRecord};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::borrow::Cow;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

pub struct PaymentService<'a, R> {
    repository: &'a R,
}

impl<'a, R> PaymentService<'a, R>
where
    R: ParkingRecordRepository + PaymentRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        PaymentService { repository }
    }

    pub async fn record_payment(&self, request: &PaymentRequest, now: DateTime<Utc>) -> Result<Payment, AppError> {
        let (Some(record_id), Some(amount_paid)) = (request.parking_record_id, request.amount_paid) else {
            return Err(AppError::BadRequest("parkingRecordId and amountPaid are required".to_string()));
        };

        let record = self
            .repository
            .get_parking_record_by_id(&record_id)
            .await?
            .ok_or_else(|| AppError::not_found("Parking record not found"))?;

        match record.status {
            ParkingStatus::Parked => return Err(AppError::conflict("Car has not exited yet, process exit first")),
            ParkingStatus::Paid => return Err(AppError::conflict("Parking record is already paid")),
            ParkingStatus::ExitedUnpaid => {}
        }

        let fee = record.parking_fee.unwrap_or(0);
        if amount_paid < fee {
            warn!(record_id = %record.id, amount_paid, fee, "payment rejected: insufficient amount");
            return Err(AppError::conflict(format!(
                "Amount paid ({amount_paid}) is less than the parking fee ({fee})"
            )));
        }

        if self.repository.get_payment_for_record(&record.id).await?.is_some() {
            return Err(AppError::conflict("Payment already recorded for this parking record"));
        }

        let payment = self
            .repository
            .record_payment(&record.id, amount_paid, now)
            .await?
            .ok_or_else(|| AppError::conflict("Parking record is already paid"))?;

        info!(payment_id = %payment.id, record_id = %record.id, amount_paid, "payment recorded");
        Ok(payment)
    }

    pub async fn list_payments(&self) -> Result<Vec<PaymentWithRecord>, AppError> {
        self.repository.list_payments().await
    }

    pub async fn get_payment(&self, id: &Uuid) -> Result<PaymentWithRecord, AppError> {
        self.repository
            .get_payment_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))
    }

    /// Total paid on `date`, counting payments in `[00:00, 24:00)` UTC.
    pub async fn daily_revenue(&self, date: NaiveDate) -> Result<i64, AppError> {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        self.repository.total_revenue_between(start, end).await
    }
}

/// Parses the `date` query parameter of the revenue report.
pub fn parse_revenue_date(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    let invalid = |message: &'static str| {
        let mut errors = ValidationErrors::new();
        errors.add("date", ValidationError::new("date").with_message(Cow::Borrowed(message)));
        AppError::ValidationError(errors)
    };

    let raw = raw.map(str::trim).filter(|d| !d.is_empty()).ok_or_else(|| invalid("date is required"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid("date must be formatted as YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parking_record::{EntryRequest, ExitRequest};
    use crate::service::fee::FeeSchedule;
    use crate::service::parking::ParkingService;
    use crate::test_utils::{MockRepository, sample_time};
    use chrono::TimeZone;

    /// Parks and releases `plate_no` after `minutes`, returning the record id.
    async fn exited_record(repo: &MockRepository, plate_no: &str, minutes: i64) -> Uuid {
        let parking = ParkingService::new(repo, FeeSchedule::default(), 3);
        parking
            .record_entry(
                &EntryRequest {
                    plate_no: plate_no.to_string(),
                    driver_name: "Jane Driver".to_string(),
                    phone_no: "0788000000".to_string(),
                    slot_no: None,
                },
                sample_time(),
            )
            .await
            .unwrap();
        parking
            .record_exit(
                &ExitRequest {
                    plate_no: plate_no.to_string(),
                },
                sample_time() + Duration::minutes(minutes),
            )
            .await
            .unwrap()
            .id
    }

    fn pay(record_id: Uuid, amount: i64) -> PaymentRequest {
        PaymentRequest {
            parking_record_id: Some(record_id),
            amount_paid: Some(amount),
        }
    }

    #[tokio::test]
    async fn payment_below_fee_is_rejected() {
        let repo = MockRepository::with_slots(&["A1"]);
        let record_id = exited_record(&repo, "RAB123C", 61).await;

        let err = PaymentService::new(&repo).record_payment(&pay(record_id, 9), sample_time()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("(9)") && msg.contains("(10)")));
    }

    #[tokio::test]
    async fn exact_payment_settles_record_once() {
        let repo = MockRepository::with_slots(&["A1"]);
        let record_id = exited_record(&repo, "RAB123C", 61).await;
        let service = PaymentService::new(&repo);

        let payment = service.record_payment(&pay(record_id, 10), sample_time()).await.unwrap();
        assert_eq!(payment.amount_paid, 10);
        assert_eq!(payment.parking_record_id, record_id);

        let err = service.record_payment(&pay(record_id, 10), sample_time()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("already paid")));
        assert_eq!(repo.state().payments.len(), 1);
    }

    #[tokio::test]
    async fn parked_record_cannot_be_paid() {
        let repo = MockRepository::with_slots(&["A1"]);
        let parking = ParkingService::new(&repo, FeeSchedule::default(), 3);
        let record = parking
            .record_entry(
                &EntryRequest {
                    plate_no: "RAB123C".to_string(),
                    driver_name: "Jane Driver".to_string(),
                    phone_no: "0788000000".to_string(),
                    slot_no: None,
                },
                sample_time(),
            )
            .await
            .unwrap();

        let err = PaymentService::new(&repo).record_payment(&pay(record.id, 100), sample_time()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("process exit first")));
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let repo = MockRepository::new();
        let err = PaymentService::new(&repo)
            .record_payment(&pay(Uuid::new_v4(), 5), sample_time())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn round_trip_ends_with_one_paid_record() {
        let repo = MockRepository::with_slots(&["A1"]);
        let record_id = exited_record(&repo, "rab123c", 120).await;
        let payments = PaymentService::new(&repo);
        payments.record_payment(&pay(record_id, 10), sample_time()).await.unwrap();

        let history = ParkingService::new(&repo, FeeSchedule::default(), 3)
            .history(Some("RAB123C"), None)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, ParkingStatus::Paid);
        assert_eq!(history[0].parking_fee, Some(10));

        let listed = payments.list_payments().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].parking_record.car.plate_no, "RAB123C");
    }

    #[tokio::test]
    async fn daily_revenue_uses_utc_day_bounds() {
        let repo = MockRepository::new();
        for (amount, hour, day) in [(5, 0, 1), (10, 23, 1), (20, 0, 2)] {
            repo.state().payments.push(Payment {
                id: Uuid::new_v4(),
                parking_record_id: Uuid::new_v4(),
                amount_paid: amount,
                payment_date: Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap(),
            });
        }

        let service = PaymentService::new(&repo);
        let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(service.daily_revenue(first).await.unwrap(), 15);
        let empty = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(service.daily_revenue(empty).await.unwrap(), 0);
    }

    #[test]
    fn revenue_date_must_be_present_and_well_formed() {
        assert_eq!(parse_revenue_date(Some("2025-03-01")).unwrap(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert!(matches!(parse_revenue_date(None), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_revenue_date(Some("01/03/2025")), Err(AppError::ValidationError(_))));
    }
}
