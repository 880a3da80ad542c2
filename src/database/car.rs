use crate::database::postgres_repository::{PostgresRepository, is_foreign_key_violation, is_unique_violation};
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarRequest, CarUpdateRequest};
use uuid::Uuid;

const CAR_COLUMNS: &str = "id, plate_no, driver_name, phone_no, created_at, updated_at";

#[async_trait::async_trait]
pub trait CarRepository {
    /// Inserts a car. `request.plate_no` must already be normalized.
    async fn create_car(&self, request: &CarRequest) -> Result<Car, AppError>;
    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError>;
    async fn get_car_by_plate(&self, plate_no: &str) -> Result<Option<Car>, AppError>;
    async fn list_cars(&self) -> Result<Vec<Car>, AppError>;
    async fn update_car(&self, id: &Uuid, request: &CarUpdateRequest) -> Result<Option<Car>, AppError>;
    /// Returns `false` when no car with `id` exists.
    async fn delete_car(&self, id: &Uuid) -> Result<bool, AppError>;
}

#[async_trait::async_trait]
impl CarRepository for PostgresRepository {
    async fn create_car(&self, request: &CarRequest) -> Result<Car, AppError> {
        let query = format!(
            r#"
            INSERT INTO car (plate_no, driver_name, phone_no)
            VALUES ($1, $2, $3)
            RETURNING {CAR_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Car>(&query)
            .bind(&request.plate_no)
            .bind(&request.driver_name)
            .bind(&request.phone_no)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Car with this plate number already exists")
                } else {
                    AppError::from(e)
                }
            })
    }

    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        let query = format!("SELECT {CAR_COLUMNS} FROM car WHERE id = $1");
        let car = sqlx::query_as::<_, Car>(&query).bind(id).fetch_optional(&self.pool).await?;
        Ok(car)
    }

    async fn get_car_by_plate(&self, plate_no: &str) -> Result<Option<Car>, AppError> {
        let query = format!("SELECT {CAR_COLUMNS} FROM car WHERE plate_no = $1");
        let car = sqlx::query_as::<_, Car>(&query).bind(plate_no).fetch_optional(&self.pool).await?;
        Ok(car)
    }

    async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        let query = format!("SELECT {CAR_COLUMNS} FROM car ORDER BY created_at DESC");
        let cars = sqlx::query_as::<_, Car>(&query).fetch_all(&self.pool).await?;
        Ok(cars)
    }

    async fn update_car(&self, id: &Uuid, request: &CarUpdateRequest) -> Result<Option<Car>, AppError> {
        let query = format!(
            r#"
            UPDATE car
            SET driver_name = COALESCE($2, driver_name),
                phone_no = COALESCE($3, phone_no),
                updated_at = now()
            WHERE id = $1
            RETURNING {CAR_COLUMNS}
            "#
        );

        let car = sqlx::query_as::<_, Car>(&query)
            .bind(id)
            .bind(request.driver_name.as_deref())
            .bind(request.phone_no.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    async fn delete_car(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM car WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::conflict("Car has parking history and cannot be deleted")
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }
}
