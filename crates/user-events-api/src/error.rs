//! User events API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use user_events_aggregation::ConfigError;
use user_events_core::error::{DomainError, ValidationError};

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The aggregation interval is invalid.
    #[error("configuration error: {0}")]
    Aggregation(#[from] ConfigError),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The Prometheus recorder could not be built or installed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short error summary.
    pub error: &'static str,
    /// What exactly was wrong with the request. Never set for server errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Errors returned to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be decoded at all.
    Malformed(String),
    /// The request decoded but failed validation.
    Rejected {
        /// Summary shown to the client.
        error: &'static str,
        /// The validation failure, shown as `details`.
        source: ValidationError,
    },
    /// The store failed. The cause is logged, not returned.
    Internal {
        /// Summary shown to the client.
        error: &'static str,
    },
}

impl ApiError {
    /// Maps a failure of the create-event path.
    #[must_use]
    pub fn from_create(err: DomainError) -> Self {
        match err {
            DomainError::Validation(source) => Self::Rejected {
                error: "validation failed",
                source,
            },
            DomainError::Storage(detail) => Self::internal("failed to insert event", &detail),
        }
    }

    /// Maps a failure of the query-events path.
    #[must_use]
    pub fn from_query(err: DomainError) -> Self {
        match err {
            DomainError::Validation(source @ ValidationError::InvalidUserId(_)) => Self::Rejected {
                error: "invalid user_id",
                source,
            },
            DomainError::Validation(source) => Self::Rejected {
                error: "invalid query parameters",
                source,
            },
            DomainError::Storage(detail) => Self::internal("failed to fetch events", &detail),
        }
    }

    fn internal(summary: &'static str, detail: &str) -> Self {
        error!(error = %detail, "{summary}");
        Self::Internal { error: summary }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Malformed(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid request",
                    details: Some(details),
                },
            ),
            Self::Rejected { error, source } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    details: Some(source.to_string()),
                },
            ),
            Self::Internal { error } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error,
                    details: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
