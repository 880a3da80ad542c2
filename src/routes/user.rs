use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::user::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse};
use crate::service::auth::{AuthService, JwtKeys};
use chrono::Utc;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// Create a staff account and receive a bearer token
#[openapi(tag = "Auth")]
#[post("/register", data = "<payload>")]
pub async fn register(
    pool: &State<PgPool>,
    keys: &State<JwtKeys>,
    payload: JsonBody<RegisterRequest>,
) -> Result<Created<Json<AuthResponse>>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let (user, token) = AuthService::new(&repo, keys).register(&payload, Utc::now()).await?;
    Ok(Created::new("/login").body(Json(AuthResponse {
        msg: "User registered successfully".to_string(),
        user: UserResponse::from(&user),
        token,
    })))
}

/// Exchange email and password for a bearer token
#[openapi(tag = "Auth")]
#[post("/login", data = "<payload>")]
pub async fn login(pool: &State<PgPool>, keys: &State<JwtKeys>, payload: JsonBody<LoginRequest>) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let (user, token) = AuthService::new(&repo, keys).login(&payload, Utc::now()).await?;
    Ok(Json(AuthResponse {
        msg: "Logged in successfully".to_string(),
        user: UserResponse::from(&user),
        token,
    }))
}

/// Tokens are stateless; the client discards its token
#[openapi(tag = "Auth")]
#[get("/logout")]
pub fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        msg: "Logged out successfully".to_string(),
    })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register, login, logout]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;
    use rocket::local::asynchronous::Client;

    #[rocket::async_test]
    async fn logout_needs_no_token() {
        let rocket = rocket::build().mount("/", rocket::routes![logout]);
        let client = Client::tracked(rocket).await.expect("valid rocket instance");

        let response = client.get("/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.as_deref(), Some(r#"{"msg":"Logged out successfully"}"#));
    }
}
