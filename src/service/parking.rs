use crate::database::car::CarRepository;
use crate::database::parking_record::ParkingRecordRepository;
use crate::database::slot::SlotRepository;
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarRequest, CarUpdateRequest, normalize_plate};
use crate::models::parking_record::{EntryRequest, ExitDetails, ExitRequest, HistoryFilter, ParkingRecord, ParkingStatus};
use crate::models::slot::{SlotStatus, normalize_slot_no};
use crate::service::car::normalized_request;
use crate::service::fee::FeeSchedule;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

const NO_ACTIVE_RECORD: &str = "No active parking record found for this car";

/// Entry, exit and history of parking sessions.
pub struct ParkingService<'a, R> {
    repository: &'a R,
    fees: FeeSchedule,
    slot_claim_attempts: u32,
}

impl<'a, R> ParkingService<'a, R>
where
    R: CarRepository + SlotRepository + ParkingRecordRepository + Sync,
{
    pub fn new(repository: &'a R, fees: FeeSchedule, slot_claim_attempts: u32) -> Self {
        ParkingService {
            repository,
            fees,
            slot_claim_attempts: slot_claim_attempts.max(1),
        }
    }

    pub async fn record_entry(&self, request: &EntryRequest, now: DateTime<Utc>) -> Result<ParkingRecord, AppError> {
        let car = self
            .resolve_car(&CarRequest {
                plate_no: request.plate_no.clone(),
                driver_name: request.driver_name.clone(),
                phone_no: request.phone_no.clone(),
            })
            .await?;

        if self.repository.get_active_record_for_car(&car.id).await?.is_some() {
            warn!(plate_no = %car.plate_no, "entry rejected: car already parked");
            return Err(AppError::conflict("Car is already parked"));
        }

        let requested_slot = request.slot_no.as_deref().map(normalize_slot_no).filter(|s| !s.is_empty());
        let record = match requested_slot {
            Some(slot_no) => self.park_in_requested_slot(&car, &slot_no, now).await?,
            None => self.park_in_first_available_slot(&car, now).await?,
        };

        info!(
            record_id = %record.id,
            plate_no = %record.car.plate_no,
            slot_no = %record.slot.slot_no,
            "car entered"
        );
        Ok(record)
    }

    pub async fn record_exit(&self, request: &ExitRequest, now: DateTime<Utc>) -> Result<ParkingRecord, AppError> {
        let plate_no = normalize_plate(&request.plate_no);
        let car = self
            .repository
            .get_car_by_plate(&plate_no)
            .await?
            .ok_or_else(|| AppError::not_found(NO_ACTIVE_RECORD))?;
        let active = self
            .repository
            .get_active_record_for_car(&car.id)
            .await?
            .ok_or_else(|| AppError::not_found(NO_ACTIVE_RECORD))?;

        let (duration_minutes, parking_fee) = self.fees.quote(active.entry_time, now)?;
        let exit = ExitDetails {
            exit_time: now,
            duration_minutes,
            parking_fee,
        };

        // A concurrent exit may have closed the record since it was read.
        let record = self
            .repository
            .finish_parking(&active.id, &exit)
            .await?
            .ok_or_else(|| AppError::not_found(NO_ACTIVE_RECORD))?;

        info!(
            record_id = %record.id,
            plate_no = %record.car.plate_no,
            duration_minutes,
            parking_fee,
            "car exited"
        );
        Ok(record)
    }

    /// Parking history, most recent entry first. An unknown plate has no history.
    pub async fn history(&self, plate_no: Option<&str>, status: Option<ParkingStatus>) -> Result<Vec<ParkingRecord>, AppError> {
        let car_id = match plate_no.map(normalize_plate).filter(|p| !p.is_empty()) {
            Some(plate_no) => match self.repository.get_car_by_plate(&plate_no).await? {
                Some(car) => Some(car.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        self.repository.list_parking_records(&HistoryFilter { car_id, status }).await
    }

    /// Finds the car by plate, registering it on first sight and refreshing
    /// the driver details when they changed.
    async fn resolve_car(&self, request: &CarRequest) -> Result<Car, AppError> {
        let request = normalized_request(request)?;

        let existing = match self.repository.get_car_by_plate(&request.plate_no).await? {
            Some(car) => car,
            None => match self.repository.create_car(&request).await {
                Ok(car) => {
                    info!(car_id = %car.id, plate_no = %car.plate_no, "car registered on entry");
                    return Ok(car);
                }
                // Lost a registration race for the same plate; use the winner's row.
                Err(AppError::Conflict(_)) => self
                    .repository
                    .get_car_by_plate(&request.plate_no)
                    .await?
                    .ok_or_else(|| AppError::not_found("Car not found"))?,
                Err(e) => return Err(e),
            },
        };

        if existing.driver_name == request.driver_name && existing.phone_no == request.phone_no {
            return Ok(existing);
        }

        let update = CarUpdateRequest {
            driver_name: Some(request.driver_name),
            phone_no: Some(request.phone_no),
        };
        self.repository
            .update_car(&existing.id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Car not found"))
    }

    async fn park_in_requested_slot(&self, car: &Car, slot_no: &str, now: DateTime<Utc>) -> Result<ParkingRecord, AppError> {
        let slot = self
            .repository
            .get_slot_by_number(slot_no)
            .await?
            .ok_or_else(|| AppError::not_found("Slot not found"))?;

        if slot.slot_status != SlotStatus::Available {
            warn!(slot_no = %slot.slot_no, status = %slot.slot_status, "entry rejected: slot not available");
            return Err(AppError::conflict("Slot is not available"));
        }

        self.repository.start_parking(&car.id, &slot.id, now).await?.ok_or_else(|| {
            warn!(slot_no = %slot.slot_no, "entry rejected: slot claimed concurrently");
            AppError::conflict("Slot is not available")
        })
    }

    async fn park_in_first_available_slot(&self, car: &Car, now: DateTime<Utc>) -> Result<ParkingRecord, AppError> {
        for attempt in 1..=self.slot_claim_attempts {
            let slot = self
                .repository
                .first_available_slot()
                .await?
                .ok_or_else(|| AppError::not_found("No available slots"))?;

            if let Some(record) = self.repository.start_parking(&car.id, &slot.id, now).await? {
                return Ok(record);
            }
            warn!(slot_no = %slot.slot_no, attempt, "slot claimed concurrently, retrying");
        }

        Err(AppError::conflict("Slots are in high demand, please retry"))
    }
}
