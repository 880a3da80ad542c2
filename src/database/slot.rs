use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::slot::{ParkingSlot, SlotStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

// Intermediate struct for sqlx query results with slot_status as text
#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    id: Uuid,
    slot_no: String,
    slot_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SlotRow> for ParkingSlot {
    fn from(row: SlotRow) -> Self {
        ParkingSlot {
            id: row.id,
            slot_no: row.slot_no,
            slot_status: slot_status_from_db(&row.slot_status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(crate) fn slot_status_from_db(value: &str) -> SlotStatus {
    match value {
        "occupied" => SlotStatus::Occupied,
        "reserved" => SlotStatus::Reserved,
        _ => SlotStatus::Available,
    }
}

const SLOT_COLUMNS: &str = "id, slot_no, slot_status, created_at, updated_at";

// A slot is only free when its status says so and no parked record holds it;
// an administrative override can leave the two out of step.
const FREE_SLOT_FILTER: &str = r#"
    slot_status = 'available'
    AND NOT EXISTS (
        SELECT 1 FROM parking_record pr
        WHERE pr.slot_id = parking_slot.id AND pr.status = 'parked'
    )
"#;

#[async_trait::async_trait]
pub trait SlotRepository {
    /// Inserts an available slot. Returns `None` when the slot number is already taken.
    async fn create_slot(&self, slot_no: &str) -> Result<Option<ParkingSlot>, AppError>;
    async fn get_slot_by_id(&self, id: &Uuid) -> Result<Option<ParkingSlot>, AppError>;
    async fn get_slot_by_number(&self, slot_no: &str) -> Result<Option<ParkingSlot>, AppError>;
    async fn list_slots(&self) -> Result<Vec<ParkingSlot>, AppError>;
    /// Slots marked available that no parked record holds.
    async fn list_available_slots(&self) -> Result<Vec<ParkingSlot>, AppError>;
    /// First free slot by slot number.
    async fn first_available_slot(&self) -> Result<Option<ParkingSlot>, AppError>;
    async fn set_slot_status(&self, id: &Uuid, status: SlotStatus) -> Result<Option<ParkingSlot>, AppError>;
}

#[async_trait::async_trait]
impl SlotRepository for PostgresRepository {
    async fn create_slot(&self, slot_no: &str) -> Result<Option<ParkingSlot>, AppError> {
        let query = format!(
            r#"
            INSERT INTO parking_slot (slot_no)
            VALUES ($1)
            ON CONFLICT (slot_no) DO NOTHING
            RETURNING {SLOT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SlotRow>(&query).bind(slot_no).fetch_optional(&self.pool).await?;
        Ok(row.map(ParkingSlot::from))
    }

    async fn get_slot_by_id(&self, id: &Uuid) -> Result<Option<ParkingSlot>, AppError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM parking_slot WHERE id = $1");
        let row = sqlx::query_as::<_, SlotRow>(&query).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(ParkingSlot::from))
    }

    async fn get_slot_by_number(&self, slot_no: &str) -> Result<Option<ParkingSlot>, AppError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM parking_slot WHERE slot_no = $1");
        let row = sqlx::query_as::<_, SlotRow>(&query).bind(slot_no).fetch_optional(&self.pool).await?;
        Ok(row.map(ParkingSlot::from))
    }

    async fn list_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM parking_slot ORDER BY slot_no ASC");
        let rows = sqlx::query_as::<_, SlotRow>(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ParkingSlot::from).collect())
    }

    async fn list_available_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM parking_slot WHERE {FREE_SLOT_FILTER} ORDER BY slot_no ASC");
        let rows = sqlx::query_as::<_, SlotRow>(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ParkingSlot::from).collect())
    }

    async fn first_available_slot(&self) -> Result<Option<ParkingSlot>, AppError> {
        let query = format!("SELECT {SLOT_COLUMNS} FROM parking_slot WHERE {FREE_SLOT_FILTER} ORDER BY slot_no ASC LIMIT 1");
        let row = sqlx::query_as::<_, SlotRow>(&query).fetch_optional(&self.pool).await?;
        Ok(row.map(ParkingSlot::from))
    }

    async fn set_slot_status(&self, id: &Uuid, status: SlotStatus) -> Result<Option<ParkingSlot>, AppError> {
        let query = format!(
            r#"
            UPDATE parking_slot
            SET slot_status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SLOT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SlotRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ParkingSlot::from))
    }
}
