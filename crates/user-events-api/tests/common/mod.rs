//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use user_events_core::repository::EventStore;
use user_events_test_support::{FixedClock, InMemoryEventStore};

use user_events_api::routes;
use user_events_api::state::AppState;

/// Fixed timestamp stamped on every event inserted through the API.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// An in-memory store whose inserts are stamped with `fixed_now()`.
pub fn in_memory_store() -> Arc<InMemoryEventStore> {
    Arc::new(InMemoryEventStore::new(FixedClock(fixed_now())))
}

/// Build the full app router over `store`, mounting event routes under
/// `base_path`. Uses the same route structure as `main.rs`.
pub fn build_test_app<S>(store: &Arc<S>, base_path: &str) -> Router
where
    S: EventStore + 'static,
{
    routes::app(AppState::from_store(store), base_path)
}

/// Send a POST request with a JSON body and return the status and raw body.
pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the status and decoded JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body_bytes) = get(app, uri).await;
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the status and raw body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, body_bytes.to_vec())
}
