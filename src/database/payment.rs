use crate::database::parking_record::{ParkingRecordRow, RECORD_COLUMNS};
use crate::database::postgres_repository::{PostgresRepository, is_unique_violation};
use crate::error::app_error::AppError;
use crate::models::payment::{Payment, PaymentWithRecord};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    payment_id: Uuid,
    payment_parking_record_id: Uuid,
    payment_amount_paid: i64,
    payment_date: DateTime<Utc>,
    #[sqlx(flatten)]
    record: ParkingRecordRow,
}

impl From<PaymentRow> for PaymentWithRecord {
    fn from(row: PaymentRow) -> Self {
        PaymentWithRecord {
            payment: Payment {
                id: row.payment_id,
                parking_record_id: row.payment_parking_record_id,
                amount_paid: row.payment_amount_paid,
                payment_date: row.payment_date,
            },
            parking_record: row.record.into(),
        }
    }
}

fn payment_select() -> String {
    format!(
        r#"
        SELECT p.id AS payment_id,
               p.parking_record_id AS payment_parking_record_id,
               p.amount_paid AS payment_amount_paid,
               p.payment_date,
               {RECORD_COLUMNS}
        FROM payment p
        JOIN parking_record pr ON pr.id = p.parking_record_id
        JOIN car c ON c.id = pr.car_id
        JOIN parking_slot s ON s.id = pr.slot_id
        "#
    )
}

#[async_trait::async_trait]
pub trait PaymentRepository {
    /// Inserts the payment and marks the record `paid` in one transaction.
    /// Returns `None` when the record is no longer `exited_unpaid`.
    async fn record_payment(&self, parking_record_id: &Uuid, amount_paid: i64, payment_date: DateTime<Utc>) -> Result<Option<Payment>, AppError>;
    async fn get_payment_by_id(&self, id: &Uuid) -> Result<Option<PaymentWithRecord>, AppError>;
    async fn get_payment_for_record(&self, parking_record_id: &Uuid) -> Result<Option<Payment>, AppError>;
    async fn list_payments(&self) -> Result<Vec<PaymentWithRecord>, AppError>;
    /// Sum of payments with `start <= payment_date < end`.
    async fn total_revenue_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, AppError>;
}

#[async_trait::async_trait]
impl PaymentRepository for PostgresRepository {
    async fn record_payment(&self, parking_record_id: &Uuid, amount_paid: i64, payment_date: DateTime<Utc>) -> Result<Option<Payment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let settled = sqlx::query("UPDATE parking_record SET status = 'paid' WHERE id = $1 AND status = 'exited_unpaid'")
            .bind(parking_record_id)
            .execute(&mut *tx)
            .await?;

        if settled.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payment (parking_record_id, amount_paid, payment_date)
            VALUES ($1, $2, $3)
            RETURNING id, parking_record_id, amount_paid, payment_date
            "#,
        )
        .bind(parking_record_id)
        .bind(amount_paid)
        .bind(payment_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Payment already recorded for this parking record")
            } else {
                AppError::from(e)
            }
        })?;

        tx.commit().await?;

        Ok(Some(payment))
    }

    async fn get_payment_by_id(&self, id: &Uuid) -> Result<Option<PaymentWithRecord>, AppError> {
        let query = format!("{} WHERE p.id = $1", payment_select());
        let row = sqlx::query_as::<_, PaymentRow>(&query).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(PaymentWithRecord::from))
    }

    async fn get_payment_for_record(&self, parking_record_id: &Uuid) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, parking_record_id, amount_paid, payment_date
            FROM payment
            WHERE parking_record_id = $1
            "#,
        )
        .bind(parking_record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn list_payments(&self) -> Result<Vec<PaymentWithRecord>, AppError> {
        let query = format!("{} ORDER BY p.payment_date DESC", payment_select());
        let rows = sqlx::query_as::<_, PaymentRow>(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PaymentWithRecord::from).collect())
    }

    async fn total_revenue_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, AppError> {
        #[derive(sqlx::FromRow)]
        struct TotalRow {
            total: i64,
        }

        let row = sqlx::query_as::<_, TotalRow>(
            r#"
            SELECT COALESCE(SUM(amount_paid), 0)::BIGINT AS total
            FROM payment
            WHERE payment_date >= $1 AND payment_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.total)
    }
}
