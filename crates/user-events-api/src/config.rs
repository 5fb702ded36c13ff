//! Server configuration, read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use user_events_aggregation::AggregationConfig;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PORT: &str = "5432";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_CORS_METHODS: &str = "GET,POST";
const DEFAULT_CORS_HEADERS: &str = "Accept,Authorization,Content-Type";

/// Cross-origin settings for browser clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    pub allow_origins: Vec<String>,
    /// Allowed request methods.
    pub allow_methods: Vec<String>,
    /// Allowed request headers.
    pub allow_headers: Vec<String>,
    /// Whether credentials may be sent.
    pub allow_credentials: bool,
}

impl CorsConfig {
    /// Builds the tower-http CORS layer.
    ///
    /// A wildcard origin combined with credentials mirrors the request
    /// origin, since browsers reject `*` on credentialed requests.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a method, header or origin is not valid
    /// HTTP.
    pub fn layer(&self) -> Result<CorsLayer, AppError> {
        let methods = self
            .allow_methods
            .iter()
            .map(|m| {
                m.parse::<Method>()
                    .map_err(|_| AppError::Config(format!("invalid CORS method: {m:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let headers = self
            .allow_headers
            .iter()
            .map(|h| {
                h.parse::<HeaderName>()
                    .map_err(|_| AppError::Config(format!("invalid CORS header: {h:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let origin = if self.allow_origins.iter().any(|o| o == "*") {
            if self.allow_credentials {
                AllowOrigin::mirror_request()
            } else {
                AllowOrigin::any()
            }
        } else {
            let origins = self
                .allow_origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>()
                        .map_err(|_| AppError::Config(format!("invalid CORS origin: {o:?}")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowOrigin::list(origins)
        };

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(self.allow_credentials))
    }
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Pool size.
    pub max_connections: u32,
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Prefix for the event routes; empty or starting with `/`, never
    /// ending with `/`.
    pub base_path: String,
    /// Aggregation scheduler settings.
    pub aggregation: AggregationConfig,
    /// Cross-origin settings.
    pub cors: CorsConfig,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
    /// Whether to apply the embedded migrations at startup.
    pub run_migrations: bool,
}

impl ApiConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` or `AppError::Aggregation` for missing or
    /// invalid values.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` or `AppError::Aggregation` for missing or
    /// invalid values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&get)?,
        };

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "DB_MAX_CONNECTIONS must be a positive integer, got {raw:?}"
                    ))
                })?,
        };

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
        };

        let base_path = normalize_base_path(get("BASE_PATH").as_deref().unwrap_or_default());

        let aggregation =
            AggregationConfig::from_env_value(lookup("AGGREGATION_INTERVAL_SECONDS").as_deref())?;

        let cors = CorsConfig {
            allow_origins: split_and_trim(
                get("CORS_ALLOW_ORIGINS").as_deref().unwrap_or(DEFAULT_CORS_ORIGINS),
            ),
            allow_methods: split_and_trim(
                get("CORS_ALLOW_METHODS").as_deref().unwrap_or(DEFAULT_CORS_METHODS),
            ),
            allow_headers: split_and_trim(
                get("CORS_ALLOW_HEADERS").as_deref().unwrap_or(DEFAULT_CORS_HEADERS),
            ),
            allow_credentials: get("CORS_ALLOW_CREDENTIALS")
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(false),
        };

        let shutdown_grace = match get("SHUTDOWN_GRACE_SECONDS") {
            None => Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                AppError::Config(format!(
                    "SHUTDOWN_GRACE_SECONDS must be a non-negative integer, got {raw:?}"
                ))
            })?,
        };

        let run_migrations = match get("RUN_MIGRATIONS") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!("RUN_MIGRATIONS must be a boolean, got {raw:?}"))
            })?,
        };

        Ok(Self {
            database_url,
            max_connections,
            host,
            port,
            base_path,
            aggregation,
            cors,
            shutdown_grace,
            run_migrations,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST` is not an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

/// Assembles a URL from `DB_USERNAME`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`,
/// `DB_DATABASE` and `DB_SCHEMA`.
fn database_url_from_parts(get: &impl Fn(&str) -> Option<String>) -> Result<String, AppError> {
    let require = |key: &str| {
        get(key).ok_or_else(|| {
            AppError::Config(format!(
                "DATABASE_URL or {key} environment variable must be set"
            ))
        })
    };

    let username = require("DB_USERNAME")?;
    let host = require("DB_HOST")?;
    let database = require("DB_DATABASE")?;
    let password = get("DB_PASSWORD").unwrap_or_default();
    let port = get("DB_PORT").unwrap_or_else(|| DEFAULT_DB_PORT.to_owned());

    let mut url = format!(
        "postgres://{}:{}@{host}:{port}/{database}",
        urlencoding::encode(&username),
        urlencoding::encode(&password),
    );
    if let Some(schema) = get("DB_SCHEMA") {
        let option = format!("-c search_path={schema}");
        url.push_str("?options=");
        url.push_str(&urlencoding::encode(&option));
    }
    Ok(url)
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

fn split_and_trim(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
