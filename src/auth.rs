use crate::error::app_error::AppError;
use crate::service::auth::JwtKeys;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tracing::warn;
use uuid::Uuid;

/// Staff member identified by a valid bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
}

pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(keys) = req.rocket().state::<JwtKeys>() else {
            return Outcome::Error((Status::InternalServerError, AppError::Unauthorized));
        };

        let Some(token) = req.headers().get_one("Authorization").and_then(bearer_token) else {
            return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
        };

        match keys.verify(token) {
            Ok(claims) => {
                let current_user = CurrentUser { id: claims.sub };
                req.local_cache(|| Some(current_user.clone()));
                Outcome::Success(current_user)
            }
            Err(err) => {
                warn!(uri = %req.uri(), "rejected bearer token");
                Outcome::Error((Status::Unauthorized, err))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some("Bearer token returned by POST /register or POST /login.".to_string()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_string(),
                bearer_format: Some("JWT".to_string()),
            },
            extensions: Object::default(),
        };

        let mut security_req = SecurityRequirement::new();
        security_req.insert("bearerAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("bearerAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Not authorized, token missing or invalid".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
