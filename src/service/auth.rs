use crate::config::JwtConfig;
use crate::database::user::{NewUser, UserRepository};
use crate::error::app_error::AppError;
use crate::models::user::{LoginRequest, RegisterRequest, User, normalize_email};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A real Argon2 hash generated once at startup, used as a timing decoy
/// so that logins for unknown emails take as long as logins for known ones.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("dummy-never-matches").ok());

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(user: &User, password: &str) -> Result<(), AppError> {
    let stored = PasswordHash::new(&user.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .map_err(|_| AppError::InvalidCredentials)
}

fn dummy_verify(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref()
        && let Ok(hash) = PasswordHash::new(hash)
    {
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// HS256 signing material plus the claims every token must carry.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::minutes(config.ttl_minutes),
        }
    }

    pub fn sign(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::Unauthorized
        })?;
        Ok(data.claims)
    }
}

pub struct AuthService<'a, R> {
    repository: &'a R,
    keys: &'a JwtKeys,
}

impl<'a, R> AuthService<'a, R>
where
    R: UserRepository + Sync,
{
    pub fn new(repository: &'a R, keys: &'a JwtKeys) -> Self {
        AuthService { repository, keys }
    }

    /// Creates the account and returns it with a fresh token.
    pub async fn register(&self, request: &RegisterRequest, now: DateTime<Utc>) -> Result<(User, String), AppError> {
        let email = normalize_email(&request.email);
        if self.repository.get_user_by_email(&email).await?.is_some() {
            warn!(email = %email, "registration rejected: email exists");
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repository
            .create_user(&NewUser {
                name: request.name.trim(),
                email: &email,
                password_hash: &password_hash,
                role: request.role.unwrap_or_default(),
            })
            .await?;

        let token = self.keys.sign(user.id, now)?;
        info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        Ok((user, token))
    }

    pub async fn login(&self, request: &LoginRequest, now: DateTime<Utc>) -> Result<(User, String), AppError> {
        let email = normalize_email(&request.email);
        let Some(user) = self.repository.get_user_by_email(&email).await? else {
            dummy_verify(&request.password);
            warn!(email = %email, "login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if let Err(e) = verify_password(&user, &request.password) {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(e);
        }

        let token = self.keys.sign(user.id, now)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }
}
