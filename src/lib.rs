mod auth;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::auth::JwtKeys;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG overrides the configured level, e.g. RUST_LOG=info,parkin_api::service=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A subscriber may already be installed when several rockets are built in one process.
    let _ = if json_format { subscriber.json().try_init() } else { subscriber.try_init() };
}

fn ensure_jwt_secret(config: &Config) {
    if !config.uses_default_jwt_secret() {
        return;
    }

    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());
    if profile != "debug" {
        panic!(
            "JWT_SECRET is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }

    tracing::warn!("Using the built-in JWT secret; set JWT_SECRET before deploying");
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Authorization", "Accept", middleware::REQUEST_ID_HEADER]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

fn get_swagger_config(openapi_url: &str) -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: openapi_url.to_string(),
        ..Default::default()
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

struct RouteSpec {
    path: String,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

impl RouteSpec {
    fn new(path: String, (routes, openapi): (Vec<rocket::Route>, rocket_okapi::okapi::openapi3::OpenApi)) -> Self {
        Self { path, routes, openapi }
    }
}

/// Auth endpoints live at the root; everything else sits under the API base path.
fn collect_route_specs(base_path: &str) -> Vec<RouteSpec> {
    vec![
        RouteSpec::new("/".to_string(), app_routes::user::routes()),
        RouteSpec::new(join_base_path(base_path, "cars"), app_routes::car::routes()),
        RouteSpec::new(join_base_path(base_path, "slots"), app_routes::slot::routes()),
        RouteSpec::new(join_base_path(base_path, "parkin"), app_routes::parking::routes()),
        RouteSpec::new(join_base_path(base_path, "payments"), app_routes::payment::routes()),
        RouteSpec::new(join_base_path(base_path, "health"), app_routes::health::routes()),
    ]
}

fn mount_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let route_specs = collect_route_specs(base_path);

    if !enable_swagger {
        for spec in route_specs {
            rocket = rocket.mount(spec.path, spec.routes);
        }
        return rocket;
    }

    let mut openapi_list = Vec::new();
    for spec in route_specs {
        rocket = rocket.mount(spec.path.clone(), spec.routes);
        // okapi joins prefix and route path verbatim, so the root prefix must be empty
        let prefix = if spec.path == "/" { String::new() } else { spec.path };
        openapi_list.push((prefix, spec.openapi));
    }

    let openapi_docs = match marge_spec_list(&openapi_list) {
        Ok(docs) => docs,
        Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
    };

    let settings = rocket_okapi::settings::OpenApiSettings::default();
    rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

    let docs_path = join_base_path(base_path, "docs");
    let openapi_url = join_base_path(base_path, "openapi.json");
    rocket.mount(docs_path, make_swagger_ui(&get_swagger_config(&openapi_url)))
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);
    ensure_jwt_secret(&config);

    let cors = match build_cors(&config.cors).to_cors() {
        Ok(cors) => cors,
        Err(err) => panic!("Failed to create CORS fairing: {}", err),
    };

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    let base_path = normalize_base_path(&config.api.base_path);
    let enable_swagger = config.api.enable_swagger;
    let keys = JwtKeys::new(&config.jwt);

    let rocket = rocket::custom(figment)
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_db(config.database.clone()))
        .manage(keys)
        .manage(config);

    mount_routes(rocket, &base_path, enable_swagger).register(
        "/",
        catchers![
            app_routes::error::bad_request,
            app_routes::error::unauthorized,
            app_routes::error::not_found,
            app_routes::error::payload_too_large,
            app_routes::error::unprocessable_entity,
            app_routes::error::internal_error
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_is_normalized() {
        assert_eq!(normalize_base_path(""), "/api");
        assert_eq!(normalize_base_path("  "), "/api");
        assert_eq!(normalize_base_path("v1/"), "/v1");
        assert_eq!(normalize_base_path("/api//"), "/api");
        assert_eq!(normalize_base_path("/"), "/");
    }

    #[test]
    fn joined_paths_have_single_slash() {
        assert_eq!(join_base_path("/api", "cars"), "/api/cars");
        assert_eq!(join_base_path("/api/", "/docs"), "/api/docs");
        assert_eq!(join_base_path("/", "health"), "/health");
    }

    #[test]
    fn route_specs_cover_every_resource() {
        let paths: Vec<String> = collect_route_specs("/api").into_iter().map(|spec| spec.path).collect();
        assert_eq!(paths, vec!["/", "/api/cars", "/api/slots", "/api/parkin", "/api/payments", "/api/health"]);
    }

    #[test]
    #[should_panic(expected = "Cannot use wildcard origins")]
    fn wildcard_cors_with_credentials_is_rejected() {
        let cors = config::CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        };
        build_cors(&cors);
    }

    #[test]
    fn explicit_origins_build_a_fairing() {
        let cors = config::CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
        };
        assert!(build_cors(&cors).to_cors().is_ok());
    }
}
