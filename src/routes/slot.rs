use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::slot::{BulkSlotRequest, SlotCreationResult, SlotResponse, SlotStatusRequest};
use crate::service::slot::SlotService;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// List all slots ordered by slot number
#[openapi(tag = "Slots")]
#[get("/")]
pub async fn list_slots(pool: &State<PgPool>, _current_user: CurrentUser) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let slots = SlotService::new(&repo).list_slots().await?;
    Ok(Json(slots.iter().map(SlotResponse::from).collect()))
}

/// List slots that can take a car right now
#[openapi(tag = "Slots")]
#[get("/available")]
pub async fn list_available_slots(pool: &State<PgPool>, _current_user: CurrentUser) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let slots = SlotService::new(&repo).list_available_slots().await?;
    Ok(Json(slots.iter().map(SlotResponse::from).collect()))
}

#[openapi(tag = "Slots")]
#[get("/<id>")]
pub async fn get_slot(pool: &State<PgPool>, _current_user: CurrentUser, id: &str) -> Result<Json<SlotResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid slot id", e))?;
    let slot = SlotService::new(&repo).get_slot(&uuid).await?;
    Ok(Json(SlotResponse::from(&slot)))
}

/// Create several slots at once; existing slot numbers are reported as skipped
#[openapi(tag = "Slots")]
#[post("/", data = "<payload>")]
pub async fn create_slots(
    pool: &State<PgPool>,
    _current_user: CurrentUser,
    payload: JsonBody<BulkSlotRequest>,
) -> Result<Created<Json<Vec<SlotCreationResult>>>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let results = SlotService::new(&repo).create_slots(&payload).await?;
    Ok(Created::new("/slots").body(Json(results)))
}

/// Override a slot's status
#[openapi(tag = "Slots")]
#[put("/<id>", data = "<payload>")]
pub async fn update_slot_status(
    pool: &State<PgPool>,
    _current_user: CurrentUser,
    id: &str,
    payload: JsonBody<SlotStatusRequest>,
) -> Result<Json<SlotResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let uuid = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid slot id", e))?;
    let slot = SlotService::new(&repo).set_slot_status(&uuid, payload.slot_status).await?;
    Ok(Json(SlotResponse::from(&slot)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_slots, list_available_slots, get_slot, create_slots, update_slot_status]
}
