use crate::database::car::CarRepository;
use crate::database::parking_record::ParkingRecordRepository;
use crate::database::payment::PaymentRepository;
use crate::database::slot::SlotRepository;
use crate::database::user::{NewUser, UserRepository};
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarRequest, CarUpdateRequest};
use crate::models::parking_record::{ExitDetails, HistoryFilter, ParkingRecord, ParkingStatus};
use crate::models::payment::{Payment, PaymentWithRecord};
use crate::models::slot::{ParkingSlot, SlotStatus};
use crate::models::user::User;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()
}

pub fn sample_car(plate_no: &str) -> Car {
    Car {
        id: Uuid::new_v4(),
        plate_no: plate_no.to_string(),
        driver_name: "Jane Driver".to_string(),
        phone_no: "0788000000".to_string(),
        created_at: sample_time(),
        updated_at: sample_time(),
    }
}

pub fn sample_slot(slot_no: &str) -> ParkingSlot {
    ParkingSlot {
        id: Uuid::new_v4(),
        slot_no: slot_no.to_string(),
        slot_status: SlotStatus::Available,
        created_at: sample_time(),
        updated_at: sample_time(),
    }
}

/// A parking record row as the database stores it: foreign keys, not joined data.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: Uuid,
    pub car_id: Uuid,
    pub slot_id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub parking_fee: Option<i64>,
    pub status: ParkingStatus,
}

#[derive(Default)]
pub struct MockState {
    pub cars: Vec<Car>,
    pub slots: Vec<ParkingSlot>,
    pub records: Vec<StoredRecord>,
    pub payments: Vec<Payment>,
    pub users: Vec<User>,
    /// Number of upcoming slot claims that lose to a concurrent request.
    pub lost_claims: u32,
}

impl MockState {
    fn join(&self, stored: &StoredRecord) -> ParkingRecord {
        ParkingRecord {
            id: stored.id,
            car: self.cars.iter().find(|c| c.id == stored.car_id).cloned().unwrap_or_default(),
            slot: self.slots.iter().find(|s| s.id == stored.slot_id).cloned().unwrap_or_default(),
            entry_time: stored.entry_time,
            exit_time: stored.exit_time,
            duration_minutes: stored.duration_minutes,
            parking_fee: stored.parking_fee,
            status: stored.status,
        }
    }

    fn slot_is_held(&self, slot_id: &Uuid) -> bool {
        self.records.iter().any(|r| r.slot_id == *slot_id && r.status == ParkingStatus::Parked)
    }

    fn slot_mut(&mut self, id: &Uuid) -> Option<&mut ParkingSlot> {
        self.slots.iter_mut().find(|s| s.id == *id)
    }
}

/// In-memory stand-in for `PostgresRepository`. Each method holds the lock
/// for its whole body, mirroring the atomicity of one database transaction.
#[derive(Default)]
pub struct MockRepository {
    state: Mutex<MockState>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(slot_nos: &[&str]) -> Self {
        let repo = Self::new();
        repo.state().slots = slot_nos.iter().map(|no| sample_slot(no)).collect();
        repo
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn slot_status(&self, slot_no: &str) -> Option<SlotStatus> {
        self.state().slots.iter().find(|s| s.slot_no == slot_no).map(|s| s.slot_status)
    }
}

#[async_trait::async_trait]
impl CarRepository for MockRepository {
    async fn create_car(&self, request: &CarRequest) -> Result<Car, AppError> {
        let mut state = self.state();
        if state.cars.iter().any(|c| c.plate_no == request.plate_no) {
            return Err(AppError::conflict("Car with this plate number already exists"));
        }
        let car = Car {
            id: Uuid::new_v4(),
            plate_no: request.plate_no.clone(),
            driver_name: request.driver_name.clone(),
            phone_no: request.phone_no.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.cars.push(car.clone());
        Ok(car)
    }

    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        Ok(self.state().cars.iter().find(|c| c.id == *id).cloned())
    }

    async fn get_car_by_plate(&self, plate_no: &str) -> Result<Option<Car>, AppError> {
        Ok(self.state().cars.iter().find(|c| c.plate_no == plate_no).cloned())
    }

    async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        Ok(self.state().cars.clone())
    }

    async fn update_car(&self, id: &Uuid, request: &CarUpdateRequest) -> Result<Option<Car>, AppError> {
        let mut state = self.state();
        let Some(car) = state.cars.iter_mut().find(|c| c.id == *id) else {
            return Ok(None);
        };
        if let Some(driver_name) = &request.driver_name {
            car.driver_name = driver_name.clone();
        }
        if let Some(phone_no) = &request.phone_no {
            car.phone_no = phone_no.clone();
        }
        car.updated_at = Utc::now();
        Ok(Some(car.clone()))
    }

    async fn delete_car(&self, id: &Uuid) -> Result<bool, AppError> {
        let mut state = self.state();
        if state.records.iter().any(|r| r.car_id == *id) {
            return Err(AppError::conflict("Car has parking history and cannot be deleted"));
        }
        let before = state.cars.len();
        state.cars.retain(|c| c.id != *id);
        Ok(state.cars.len() < before)
    }
}

#[async_trait::async_trait]
impl SlotRepository for MockRepository {
    async fn create_slot(&self, slot_no: &str) -> Result<Option<ParkingSlot>, AppError> {
        let mut state = self.state();
        if state.slots.iter().any(|s| s.slot_no == slot_no) {
            return Ok(None);
        }
        let slot = sample_slot(slot_no);
        state.slots.push(slot.clone());
        Ok(Some(slot))
    }

    async fn get_slot_by_id(&self, id: &Uuid) -> Result<Option<ParkingSlot>, AppError> {
        Ok(self.state().slots.iter().find(|s| s.id == *id).cloned())
    }

    async fn get_slot_by_number(&self, slot_no: &str) -> Result<Option<ParkingSlot>, AppError> {
        Ok(self.state().slots.iter().find(|s| s.slot_no == slot_no).cloned())
    }

    async fn list_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        let mut slots = self.state().slots.clone();
        slots.sort_by(|a, b| a.slot_no.cmp(&b.slot_no));
        Ok(slots)
    }

    async fn list_available_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        let slots = self.list_slots().await?;
        let state = self.state();
        Ok(slots
            .into_iter()
            .filter(|s| s.slot_status == SlotStatus::Available && !state.slot_is_held(&s.id))
            .collect())
    }

    async fn first_available_slot(&self) -> Result<Option<ParkingSlot>, AppError> {
        Ok(self.list_available_slots().await?.into_iter().next())
    }

    async fn set_slot_status(&self, id: &Uuid, status: SlotStatus) -> Result<Option<ParkingSlot>, AppError> {
        let mut state = self.state();
        Ok(state.slot_mut(id).map(|slot| {
            slot.slot_status = status;
            slot.clone()
        }))
    }
}

#[async_trait::async_trait]
impl ParkingRecordRepository for MockRepository {
    async fn start_parking(&self, car_id: &Uuid, slot_id: &Uuid, entry_time: DateTime<Utc>) -> Result<Option<ParkingRecord>, AppError> {
        let mut state = self.state();

        if state.lost_claims > 0 {
            // Another request grabbed the slot between lookup and claim.
            state.lost_claims -= 1;
            if let Some(slot) = state.slot_mut(slot_id) {
                slot.slot_status = SlotStatus::Occupied;
            }
            return Ok(None);
        }

        // One parked record per slot, as the partial unique index enforces.
        if state.slot_is_held(slot_id) {
            return Ok(None);
        }

        match state.slot_mut(slot_id) {
            Some(slot) if slot.slot_status == SlotStatus::Available => slot.slot_status = SlotStatus::Occupied,
            _ => return Ok(None),
        }

        if state.records.iter().any(|r| r.car_id == *car_id && r.status == ParkingStatus::Parked) {
            if let Some(slot) = state.slot_mut(slot_id) {
                slot.slot_status = SlotStatus::Available;
            }
            return Err(AppError::conflict("Car is already parked"));
        }

        let stored = StoredRecord {
            id: Uuid::new_v4(),
            car_id: *car_id,
            slot_id: *slot_id,
            entry_time,
            exit_time: None,
            duration_minutes: None,
            parking_fee: None,
            status: ParkingStatus::Parked,
        };
        let record = state.join(&stored);
        state.records.push(stored);
        Ok(Some(record))
    }

    async fn finish_parking(&self, record_id: &Uuid, exit: &ExitDetails) -> Result<Option<ParkingRecord>, AppError> {
        let mut state = self.state();
        let Some(stored) = state.records.iter_mut().find(|r| r.id == *record_id && r.status == ParkingStatus::Parked) else {
            return Ok(None);
        };
        stored.exit_time = Some(exit.exit_time);
        stored.duration_minutes = Some(exit.duration_minutes);
        stored.parking_fee = Some(exit.parking_fee);
        stored.status = ParkingStatus::ExitedUnpaid;
        let stored = stored.clone();

        if let Some(slot) = state.slot_mut(&stored.slot_id) {
            slot.slot_status = SlotStatus::Available;
        }
        Ok(Some(state.join(&stored)))
    }

    async fn get_active_record_for_car(&self, car_id: &Uuid) -> Result<Option<ParkingRecord>, AppError> {
        let state = self.state();
        Ok(state
            .records
            .iter()
            .find(|r| r.car_id == *car_id && r.status == ParkingStatus::Parked)
            .map(|r| state.join(r)))
    }

    async fn get_parking_record_by_id(&self, id: &Uuid) -> Result<Option<ParkingRecord>, AppError> {
        let state = self.state();
        Ok(state.records.iter().find(|r| r.id == *id).map(|r| state.join(r)))
    }

    async fn list_parking_records(&self, filter: &HistoryFilter) -> Result<Vec<ParkingRecord>, AppError> {
        let state = self.state();
        let mut records: Vec<ParkingRecord> = state
            .records
            .iter()
            .filter(|r| filter.car_id.is_none_or(|id| r.car_id == id))
            .filter(|r| filter.status.is_none_or(|status| r.status == status))
            .map(|r| state.join(r))
            .collect();
        records.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        Ok(records)
    }
}

#[async_trait::async_trait]
impl PaymentRepository for MockRepository {
    async fn record_payment(&self, parking_record_id: &Uuid, amount_paid: i64, payment_date: DateTime<Utc>) -> Result<Option<Payment>, AppError> {
        let mut state = self.state();
        let Some(index) = state
            .records
            .iter()
            .position(|r| r.id == *parking_record_id && r.status == ParkingStatus::ExitedUnpaid)
        else {
            return Ok(None);
        };
        if state.payments.iter().any(|p| p.parking_record_id == *parking_record_id) {
            return Err(AppError::conflict("Payment already recorded for this parking record"));
        }
        state.records[index].status = ParkingStatus::Paid;

        let payment = Payment {
            id: Uuid::new_v4(),
            parking_record_id: *parking_record_id,
            amount_paid,
            payment_date,
        };
        state.payments.push(payment.clone());
        Ok(Some(payment))
    }

    async fn get_payment_by_id(&self, id: &Uuid) -> Result<Option<PaymentWithRecord>, AppError> {
        let state = self.state();
        let Some(payment) = state.payments.iter().find(|p| p.id == *id) else {
            return Ok(None);
        };
        let parking_record = state
            .records
            .iter()
            .find(|r| r.id == payment.parking_record_id)
            .map(|r| state.join(r))
            .unwrap_or_default();
        Ok(Some(PaymentWithRecord {
            payment: payment.clone(),
            parking_record,
        }))
    }

    async fn get_payment_for_record(&self, parking_record_id: &Uuid) -> Result<Option<Payment>, AppError> {
        Ok(self.state().payments.iter().find(|p| p.parking_record_id == *parking_record_id).cloned())
    }

    async fn list_payments(&self) -> Result<Vec<PaymentWithRecord>, AppError> {
        let ids: Vec<Uuid> = self.state().payments.iter().map(|p| p.id).collect();
        let mut payments = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(payment) = self.get_payment_by_id(&id).await? {
                payments.push(payment);
            }
        }
        payments.sort_by(|a, b| b.payment.payment_date.cmp(&a.payment.payment_date));
        Ok(payments)
    }

    async fn total_revenue_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, AppError> {
        Ok(self
            .state()
            .payments
            .iter()
            .filter(|p| p.payment_date >= start && p.payment_date < end)
            .map(|p| p.amount_paid)
            .sum())
    }
}

#[async_trait::async_trait]
impl UserRepository for MockRepository {
    async fn create_user(&self, user: &NewUser<'_>) -> Result<User, AppError> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict("User already exists"));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.state().users.iter().find(|u| u.email == email).cloned())
    }
}
