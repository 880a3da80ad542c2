use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Not authorized, token missing or invalid")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("Internal server error")]
    Token {
        message: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Exit time precedes entry time")]
    InvalidInterval,
    #[error("Invalid id format")]
    UuidError {
        message: String,
        #[source]
        source: uuid::Error,
    },
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub msg: String,
}

impl ErrorBody {
    pub fn json(msg: impl Into<String>) -> String {
        let body = ErrorBody { msg: msg.into() };
        serde_json::to_string(&body).unwrap_or_else(|_| r#"{"msg":"Internal server error"}"#.to_string())
    }
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn uuid(message: impl Into<String>, source: uuid::Error) -> Self {
        Self::UuidError {
            message: message.into(),
            source,
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }

    pub fn token(message: impl Into<String>, source: jsonwebtoken::errors::Error) -> Self {
        Self::Token {
            message: message.into(),
            source,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    fn is_server_error(&self) -> bool {
        Status::from(self).class().is_server_error()
    }
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        AppError::password_hash("Password hashing failed", e)
    }
}

impl From<uuid::Error> for AppError {
    fn from(e: uuid::Error) -> Self {
        AppError::uuid("Invalid UUID", e)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::token("Token signing failed", e)
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::InvalidCredentials => Status::BadRequest,
            AppError::PasswordHash { .. } => Status::InternalServerError,
            AppError::Token { .. } => Status::InternalServerError,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            // Business rule violations share the 400 status with validation failures.
            AppError::Conflict(_) => Status::BadRequest,
            AppError::InvalidInterval => Status::BadRequest,
            AppError::UuidError { .. } => Status::BadRequest,
            AppError::ValidationError(_) => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let user_id = req
            .local_cache(|| None::<crate::auth::CurrentUser>)
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        if self.is_server_error() {
            error!(
                error = ?self,
                request_id = %request_id,
                user_id = %user_id,
                method = %method,
                uri = %uri,
                "request failed"
            );
        } else {
            warn!(
                error = %self,
                request_id = %request_id,
                user_id = %user_id,
                method = %method,
                uri = %uri,
                "request rejected"
            );
        }

        let status = Status::from(&self);
        let body = ErrorBody::json(self.to_string());

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Validation failure or business rule violation"),
            ("401", "Missing or invalid bearer token"),
            ("404", "Not Found"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_violations_map_to_bad_request() {
        assert_eq!(Status::from(&AppError::conflict("already parked")), Status::BadRequest);
        assert_eq!(Status::from(&AppError::InvalidCredentials), Status::BadRequest);
        assert_eq!(Status::from(&AppError::InvalidInterval), Status::BadRequest);
    }

    #[test]
    fn lookup_and_token_failures_keep_their_status() {
        assert_eq!(Status::from(&AppError::not_found("Car not found")), Status::NotFound);
        assert_eq!(Status::from(&AppError::Unauthorized), Status::Unauthorized);
        assert_eq!(Status::from(&AppError::from(sqlx::Error::PoolTimedOut)), Status::InternalServerError);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn server_errors_hide_details() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn error_body_is_msg_json() {
        let body = ErrorBody::json("Car not found");
        assert_eq!(body, r#"{"msg":"Car not found"}"#);
    }
}
