use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    #[default]
    Attendant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Attendant => "attendant",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AuthResponse {
    pub msg: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct MessageResponse {
    pub msg: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_attendant() {
        let request: RegisterRequest = serde_json::from_str(r#"{"name":"Ann","email":"ann@example.com","password":"longenough"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.role.unwrap_or_default(), Role::Attendant);
    }

    #[test]
    fn short_password_is_rejected() {
        let request: RegisterRequest = serde_json::from_str(r#"{"name":"Ann","email":"ann@example.com","password":"short"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn password_hash_is_not_part_of_the_response() {
        let user = User {
            password_hash: "$argon2id$secret".to_string(),
            ..User::default()
        };
        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn emails_are_lower_cased() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }
}
