use crate::Config;
use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::parking_record::{EntryRequest, ExitRequest, HistoryQuery, ParkingEventResponse, ParkingRecordResponse};
use crate::service::fee::FeeSchedule;
use crate::service::parking::ParkingService;
use chrono::Utc;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

fn parking_service<'a>(repo: &'a PostgresRepository, config: &Config) -> ParkingService<'a, PostgresRepository> {
    ParkingService::new(repo, FeeSchedule::from(&config.pricing), config.pricing.slot_claim_attempts)
}

/// Record a car entering the lot
#[openapi(tag = "Parking")]
#[post("/entry", data = "<payload>")]
pub async fn record_entry(
    pool: &State<PgPool>,
    config: &State<Config>,
    _current_user: CurrentUser,
    payload: JsonBody<EntryRequest>,
) -> Result<Created<Json<ParkingEventResponse>>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let record = parking_service(&repo, config).record_entry(&payload, Utc::now()).await?;
    Ok(Created::new(format!("/parkin/history?plateNo={}", record.car.plate_no)).body(Json(ParkingEventResponse {
        msg: "Car entry recorded successfully".to_string(),
        parking_record: ParkingRecordResponse::from(&record),
    })))
}

/// Record a car leaving the lot; computes duration and fee
#[openapi(tag = "Parking")]
#[post("/exit", data = "<payload>")]
pub async fn record_exit(
    pool: &State<PgPool>,
    config: &State<Config>,
    _current_user: CurrentUser,
    payload: JsonBody<ExitRequest>,
) -> Result<Json<ParkingEventResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let record = parking_service(&repo, config).record_exit(&payload, Utc::now()).await?;
    Ok(Json(ParkingEventResponse {
        msg: "Car exit recorded successfully".to_string(),
        parking_record: ParkingRecordResponse::from(&record),
    }))
}

/// Parking history, most recent first, optionally filtered by plate and status
#[openapi(tag = "Parking")]
#[get("/history?<query..>")]
pub async fn history(
    pool: &State<PgPool>,
    config: &State<Config>,
    _current_user: CurrentUser,
    query: HistoryQuery,
) -> Result<Json<Vec<ParkingRecordResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let records = parking_service(&repo, config).history(query.plate_no.as_deref(), query.status).await?;
    Ok(Json(records.iter().map(ParkingRecordResponse::from).collect()))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![record_entry, record_exit, history]
}
