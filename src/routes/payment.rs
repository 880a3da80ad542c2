use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::payment::{DailyRevenueResponse, PaymentDetailResponse, PaymentRecordedResponse, PaymentRequest, PaymentResponse};
use crate::service::payment::{PaymentService, parse_revenue_date};
use chrono::Utc;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Pay for an exited parking record
#[openapi(tag = "Payments")]
#[post("/", data = "<payload>")]
pub async fn record_payment(
    pool: &State<PgPool>,
    _current_user: CurrentUser,
    payload: JsonBody<PaymentRequest>,
) -> Result<Created<Json<PaymentRecordedResponse>>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let payment = PaymentService::new(&repo).record_payment(&payload, Utc::now()).await?;
    Ok(Created::new(format!("/payments/{}", payment.id)).body(Json(PaymentRecordedResponse {
        msg: "Payment recorded successfully".to_string(),
        payment: PaymentResponse::from(&payment),
    })))
}

/// List payments, most recent first
#[openapi(tag = "Payments")]
#[get("/")]
pub async fn list_payments(pool: &State<PgPool>, _current_user: CurrentUser) -> Result<Json<Vec<PaymentDetailResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let payments = PaymentService::new(&repo).list_payments().await?;
    Ok(Json(payments.iter().map(PaymentDetailResponse::from).collect()))
}

/// Revenue collected on one UTC calendar day
#[openapi(tag = "Payments")]
#[get("/daily-revenue?<date>")]
pub async fn daily_revenue(pool: &State<PgPool>, _current_user: CurrentUser, date: Option<String>) -> Result<Json<DailyRevenueResponse>, AppError> {
    let date = parse_revenue_date(date.as_deref())?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let total = PaymentService::new(&repo).daily_revenue(date).await?;
    Ok(Json(DailyRevenueResponse::new(date, total)))
}

#[openapi(tag = "Payments")]
#[get("/<id>")]
pub async fn get_payment(pool: &State<PgPool>, _current_user: CurrentUser, id: &str) -> Result<Json<PaymentDetailResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid payment id", e))?;
    let payment = PaymentService::new(&repo).get_payment(&uuid).await?;
    Ok(Json(PaymentDetailResponse::from(&payment)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![record_payment, list_payments, daily_revenue, get_payment]
}
