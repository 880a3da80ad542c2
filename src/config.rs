use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api";
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub api: ApiConfig,
    pub jwt: JwtConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Tariff and slot allocation settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PricingConfig {
    /// Charge per started hour, in whole currency units.
    pub hourly_rate: i64,
    /// Stays up to and including this many minutes are free.
    pub free_minutes: i64,
    /// How often automatic slot selection retries after losing a claim race.
    pub slot_claim_attempts: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/parkin".to_string(),
            max_connections: 16,
            min_connections: 2,
            acquire_timeout: 5,
            run_migrations: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: true,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            issuer: "parkin".to_string(),
            audience: "parkin-staff".to_string(),
            ttl_minutes: 60 * 24,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            hourly_rate: 5,
            free_minutes: 15,
            slot_claim_attempts: 3,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Parking.toml (nested by Rocket-style profile)
    /// 3. Environment variables prefixed with PARKIN_ (`__` separates sections)
    /// 4. DATABASE_URL, JWT_SECRET and PORT as plain variables
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("Parking.toml").nested())
            .merge(Env::prefixed("PARKIN_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "jwt.secret".into()))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt.secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_tariff() {
        let config = Config::default();
        assert_eq!(config.pricing.hourly_rate, 5);
        assert_eq!(config.pricing.free_minutes, 15);
        assert!(config.pricing.slot_claim_attempts >= 1);
        assert_eq!(config.api.base_path, DEFAULT_API_BASE_PATH);
        assert_eq!(config.jwt.ttl_minutes, 1440);
    }

    #[test]
    fn default_secret_is_flagged() {
        let mut config = Config::default();
        assert!(config.uses_default_jwt_secret());
        config.jwt.secret = "something-else".to_string();
        assert!(!config.uses_default_jwt_secret());
    }

    #[test]
    fn defaults_extract_through_figment() {
        let config: Config = Figment::from(Serialized::defaults(Config::default())).extract().expect("defaults should extract");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.max_connections, 16);
    }
}
