use crate::database::car::CarRepository;
use crate::database::parking_record::ParkingRecordRepository;
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarRequest, CarUpdateRequest, normalize_plate};
use tracing::{info, warn};
use uuid::Uuid;

pub struct CarService<'a, R> {
    repository: &'a R,
}

impl<'a, R> CarService<'a, R>
where
    R: CarRepository + ParkingRecordRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        CarService { repository }
    }

    pub async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        self.repository.list_cars().await
    }

    pub async fn get_car_by_plate(&self, plate_no: &str) -> Result<Car, AppError> {
        self.repository
            .get_car_by_plate(&normalize_plate(plate_no))
            .await?
            .ok_or_else(|| AppError::not_found("Car not found"))
    }

    pub async fn get_car_by_id(&self, id: &Uuid) -> Result<Car, AppError> {
        self.repository.get_car_by_id(id).await?.ok_or_else(|| AppError::not_found("Car not found"))
    }

    pub async fn create_car(&self, request: &CarRequest) -> Result<Car, AppError> {
        let normalized = normalized_request(request)?;
        if self.repository.get_car_by_plate(&normalized.plate_no).await?.is_some() {
            warn!(plate_no = %normalized.plate_no, "car registration rejected: plate exists");
            return Err(AppError::conflict("Car with this plate number already exists"));
        }

        let car = self.repository.create_car(&normalized).await?;
        info!(car_id = %car.id, plate_no = %car.plate_no, "car registered");
        Ok(car)
    }

    pub async fn update_car(&self, id: &Uuid, request: &CarUpdateRequest) -> Result<Car, AppError> {
        let request = CarUpdateRequest {
            driver_name: trimmed_field(request.driver_name.as_deref(), "driverName must not be empty")?,
            phone_no: trimmed_field(request.phone_no.as_deref(), "phoneNo must not be empty")?,
        };
        self.repository
            .update_car(id, &request)
            .await?
            .ok_or_else(|| AppError::not_found("Car not found"))
    }

    pub async fn delete_car(&self, id: &Uuid) -> Result<(), AppError> {
        let car = self.get_car_by_id(id).await?;
        if self.repository.get_active_record_for_car(&car.id).await?.is_some() {
            warn!(car_id = %car.id, "car deletion rejected: car is parked");
            return Err(AppError::conflict("Car is currently parked and cannot be deleted"));
        }

        if !self.repository.delete_car(&car.id).await? {
            return Err(AppError::not_found("Car not found"));
        }
        info!(car_id = %car.id, plate_no = %car.plate_no, "car deleted");
        Ok(())
    }
}

fn required_field(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(message.to_string()));
    }
    Ok(trimmed.to_string())
}

fn trimmed_field(value: Option<&str>, message: &str) -> Result<Option<String>, AppError> {
    value.map(|v| required_field(v, message)).transpose()
}

/// Trims every field and canonicalizes the plate. Blank fields are rejected.
pub(crate) fn normalized_request(request: &CarRequest) -> Result<CarRequest, AppError> {
    let plate_no = normalize_plate(&request.plate_no);
    if plate_no.is_empty() {
        return Err(AppError::BadRequest("plateNo is required".to_string()));
    }
    Ok(CarRequest {
        plate_no,
        driver_name: required_field(&request.driver_name, "driverName is required")?,
        phone_no: required_field(&request.phone_no, "phoneNo is required")?,
    })
}
