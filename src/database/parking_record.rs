use crate::database::postgres_repository::{PostgresRepository, is_unique_violation, violated_constraint};
use crate::database::slot::slot_status_from_db;
use crate::error::app_error::AppError;
use crate::models::car::Car;
use crate::models::parking_record::{ExitDetails, HistoryFilter, ParkingRecord, ParkingStatus};
use crate::models::slot::ParkingSlot;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

// Columns of a parking record joined with its car (`c`) and slot (`s`).
pub(crate) const RECORD_COLUMNS: &str = r#"
    pr.id,
    pr.entry_time,
    pr.exit_time,
    pr.duration_minutes,
    pr.parking_fee,
    pr.status,
    c.id AS car_id,
    c.plate_no AS car_plate_no,
    c.driver_name AS car_driver_name,
    c.phone_no AS car_phone_no,
    c.created_at AS car_created_at,
    c.updated_at AS car_updated_at,
    s.id AS slot_id,
    s.slot_no AS slot_slot_no,
    s.slot_status AS slot_slot_status,
    s.created_at AS slot_created_at,
    s.updated_at AS slot_updated_at
"#;

const RECORD_FROM: &str = r#"
    FROM parking_record pr
    JOIN car c ON c.id = pr.car_id
    JOIN parking_slot s ON s.id = pr.slot_id
"#;

// Intermediate struct for sqlx query results with all JOINed data
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ParkingRecordRow {
    id: Uuid,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
    parking_fee: Option<i64>,
    status: String,
    // Car fields
    car_id: Uuid,
    car_plate_no: String,
    car_driver_name: String,
    car_phone_no: String,
    car_created_at: DateTime<Utc>,
    car_updated_at: DateTime<Utc>,
    // Slot fields
    slot_id: Uuid,
    slot_slot_no: String,
    slot_slot_status: String,
    slot_created_at: DateTime<Utc>,
    slot_updated_at: DateTime<Utc>,
}

impl From<ParkingRecordRow> for ParkingRecord {
    fn from(row: ParkingRecordRow) -> Self {
        ParkingRecord {
            id: row.id,
            car: Car {
                id: row.car_id,
                plate_no: row.car_plate_no,
                driver_name: row.car_driver_name,
                phone_no: row.car_phone_no,
                created_at: row.car_created_at,
                updated_at: row.car_updated_at,
            },
            slot: ParkingSlot {
                id: row.slot_id,
                slot_no: row.slot_slot_no,
                slot_status: slot_status_from_db(&row.slot_slot_status),
                created_at: row.slot_created_at,
                updated_at: row.slot_updated_at,
            },
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            duration_minutes: row.duration_minutes,
            parking_fee: row.parking_fee,
            status: parking_status_from_db(&row.status),
        }
    }
}

pub(crate) fn parking_status_from_db(value: &str) -> ParkingStatus {
    match value {
        "exited_unpaid" => ParkingStatus::ExitedUnpaid,
        "paid" => ParkingStatus::Paid,
        _ => ParkingStatus::Parked,
    }
}

#[derive(sqlx::FromRow)]
struct IdRow {
    id: Uuid,
}

async fn fetch_record(conn: &mut PgConnection, id: &Uuid) -> Result<ParkingRecord, AppError> {
    let query = format!("SELECT {RECORD_COLUMNS} {RECORD_FROM} WHERE pr.id = $1");
    let row = sqlx::query_as::<_, ParkingRecordRow>(&query).bind(id).fetch_one(conn).await?;
    Ok(row.into())
}

#[async_trait::async_trait]
pub trait ParkingRecordRepository {
    /// Claims the slot and opens a `parked` record in one transaction.
    /// Returns `None` when the slot was no longer free.
    async fn start_parking(&self, car_id: &Uuid, slot_id: &Uuid, entry_time: DateTime<Utc>) -> Result<Option<ParkingRecord>, AppError>;
    /// Closes a `parked` record and releases its slot in one transaction.
    /// Returns `None` when the record is no longer `parked`.
    async fn finish_parking(&self, record_id: &Uuid, exit: &ExitDetails) -> Result<Option<ParkingRecord>, AppError>;
    async fn get_active_record_for_car(&self, car_id: &Uuid) -> Result<Option<ParkingRecord>, AppError>;
    async fn get_parking_record_by_id(&self, id: &Uuid) -> Result<Option<ParkingRecord>, AppError>;
    /// Records matching `filter`, most recent entry first.
    async fn list_parking_records(&self, filter: &HistoryFilter) -> Result<Vec<ParkingRecord>, AppError>;
}

#[async_trait::async_trait]
impl ParkingRecordRepository for PostgresRepository {
    async fn start_parking(&self, car_id: &Uuid, slot_id: &Uuid, entry_time: DateTime<Utc>) -> Result<Option<ParkingRecord>, AppError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r#"
            UPDATE parking_slot
            SET slot_status = 'occupied', updated_at = now()
            WHERE id = $1
              AND slot_status = 'available'
              AND NOT EXISTS (SELECT 1 FROM parking_record WHERE slot_id = $1 AND status = 'parked')
            "#,
        )
        .bind(slot_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, IdRow>(
            r#"
            INSERT INTO parking_record (car_id, slot_id, entry_time, status)
            VALUES ($1, $2, $3, 'parked')
            RETURNING id
            "#,
        )
        .bind(car_id)
        .bind(slot_id)
        .bind(entry_time)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) && violated_constraint(&e) == Some("parking_record_one_active_per_car") => {
                return Err(AppError::conflict("Car is already parked"));
            }
            // Another parked record holds the slot: the claim is lost, same as a zero-row update.
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record = fetch_record(&mut *tx, &inserted.id).await?;
        tx.commit().await?;

        Ok(Some(record))
    }

    async fn finish_parking(&self, record_id: &Uuid, exit: &ExitDetails) -> Result<Option<ParkingRecord>, AppError> {
        let mut tx = self.pool.begin().await?;

        #[derive(sqlx::FromRow)]
        struct SlotIdRow {
            slot_id: Uuid,
        }

        let closed = sqlx::query_as::<_, SlotIdRow>(
            r#"
            UPDATE parking_record
            SET exit_time = $2, duration_minutes = $3, parking_fee = $4, status = 'exited_unpaid'
            WHERE id = $1 AND status = 'parked'
            RETURNING slot_id
            "#,
        )
        .bind(record_id)
        .bind(exit.exit_time)
        .bind(exit.duration_minutes)
        .bind(exit.parking_fee)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(closed) = closed else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE parking_slot SET slot_status = 'available', updated_at = now() WHERE id = $1")
            .bind(closed.slot_id)
            .execute(&mut *tx)
            .await?;

        let record = fetch_record(&mut *tx, record_id).await?;
        tx.commit().await?;

        Ok(Some(record))
    }

    async fn get_active_record_for_car(&self, car_id: &Uuid) -> Result<Option<ParkingRecord>, AppError> {
        let query = format!("SELECT {RECORD_COLUMNS} {RECORD_FROM} WHERE pr.car_id = $1 AND pr.status = 'parked'");
        let row = sqlx::query_as::<_, ParkingRecordRow>(&query).bind(car_id).fetch_optional(&self.pool).await?;
        Ok(row.map(ParkingRecord::from))
    }

    async fn get_parking_record_by_id(&self, id: &Uuid) -> Result<Option<ParkingRecord>, AppError> {
        let query = format!("SELECT {RECORD_COLUMNS} {RECORD_FROM} WHERE pr.id = $1");
        let row = sqlx::query_as::<_, ParkingRecordRow>(&query).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(ParkingRecord::from))
    }

    async fn list_parking_records(&self, filter: &HistoryFilter) -> Result<Vec<ParkingRecord>, AppError> {
        let query = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            {RECORD_FROM}
            WHERE ($1::uuid IS NULL OR pr.car_id = $1)
              AND ($2::text IS NULL OR pr.status = $2)
            ORDER BY pr.entry_time DESC
            "#
        );

        let rows = sqlx::query_as::<_, ParkingRecordRow>(&query)
            .bind(filter.car_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ParkingRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parking_status_round_trips_through_db_text() {
        for status in [ParkingStatus::Parked, ParkingStatus::ExitedUnpaid, ParkingStatus::Paid] {
            assert_eq!(parking_status_from_db(status.as_str()), status);
        }
    }
}
