//! Routes for event ingestion and query.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, middleware, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use user_events_ingestion::application::query_handlers::EventView;
use user_events_ingestion::application::{command_handlers, query_handlers};
use user_events_ingestion::domain::commands;
use user_events_ingestion::domain::queries::EventQuery;

use crate::error::ApiError;
use crate::observability;
use crate::state::AppState;

/// Request body for POST /events.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// The acting user.
    pub user_id: i64,
    /// What the user did.
    pub action: String,
    /// Optional string metadata; only `page` is kept.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

/// POST /events
#[instrument(skip_all)]
async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Malformed(rejection.body_text()))?;

    let command = commands::RecordEvent {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
        action: request.action,
        metadata: request.metadata,
    };

    info!(
        correlation_id = %command.correlation_id,
        user_id = command.user_id,
        "handling record_event command"
    );

    command_handlers::handle_record_event(&command, &*state.event_repository)
        .await
        .map_err(ApiError::from_create)?;

    Ok(StatusCode::CREATED)
}

/// GET /events?user_id=&from=&to=
#[instrument(skip_all)]
async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventQuery>, QueryRejection>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::Malformed(rejection.body_text()))?;

    let events = query_handlers::handle_get_events(&query, &*state.event_repository)
        .await
        .map_err(ApiError::from_query)?;

    Ok(Json(events))
}

/// Returns the router for event ingestion and query, instrumented with
/// request metrics.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route_layer(middleware::from_fn(observability::track_http_metrics))
}
