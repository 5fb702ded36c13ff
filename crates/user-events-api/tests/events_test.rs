//! Integration tests for event ingestion and query over the full router.

mod common;

use axum::http::StatusCode;
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::json;
use user_events_aggregation::run_aggregation_tick;
use user_events_core::event::NewEvent;
use user_events_test_support::FixedClock;

fn new_event(user_id: i64, action: &str) -> NewEvent {
    NewEvent {
        user_id,
        action: action.to_owned(),
        metadata_page: None,
    }
}

#[tokio::test]
async fn test_post_then_get_returns_created_event() {
    let store = common::in_memory_store();

    let (status, body) = common::post_json(
        common::build_test_app(&store, ""),
        "/events",
        &json!({ "user_id": 42, "action": "signup", "metadata": { "page": "/welcome" } }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());

    let (status, json) = common::get_json(
        common::build_test_app(&store, ""),
        "/events?user_id=42&from=2026-01-15&to=2026-01-16",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([{
            "id": 1,
            "user_id": 42,
            "action": "signup",
            "metadata_page": "/welcome",
            "created_at": "2026-01-15T10:00:00Z"
        }])
    );
}

#[tokio::test]
async fn test_get_orders_newest_first_with_ties_by_id() {
    let store = common::in_memory_store();
    let early = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2026, 1, 15, 11, 0, 0).unwrap();
    store.seed_event(&new_event(1, "a"), early);
    store.seed_event(&new_event(1, "b"), late);
    store.seed_event(&new_event(1, "c"), late);

    let (status, json) = common::get_json(
        common::build_test_app(&store, ""),
        "/events?from=2026-01-15&to=2026-01-16",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_get_bounds_are_inclusive_and_user_filter_applies() {
    let store = common::in_memory_store();
    let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
    store.seed_event(&new_event(7, "at-from"), from);
    store.seed_event(&new_event(7, "at-to"), to);
    store.seed_event(&new_event(7, "after"), to + TimeDelta::seconds(1));
    store.seed_event(&new_event(8, "other-user"), from);

    let (status, json) = common::get_json(
        common::build_test_app(&store, ""),
        "/events?user_id=7&from=2026-01-01T00:00:00Z&to=2026-01-02%2000:00:00",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["at-to", "at-from"]);
}

#[tokio::test]
async fn test_get_accepts_double_encoded_offset_timestamps() {
    let store = common::in_memory_store();
    store.seed_event(
        &new_event(3, "view"),
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
    );

    // 2026-01-01T13:00:00+01:00 encoded twice.
    let (status, json) = common::get_json(
        common::build_test_app(&store, ""),
        "/events?from=2026-01-01T13%253A00%253A00%252B01%253A00&to=2026-01-01T12%253A00%253A00Z",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_rejects_unparseable_time() {
    let store = common::in_memory_store();

    let (status, json) = common::get_json(
        common::build_test_app(&store, ""),
        "/events?from=yesterday&to=2026-01-02",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid query parameters");
}

#[tokio::test]
async fn test_post_rejection_leaves_store_untouched() {
    let store = common::in_memory_store();

    let (status, _) = common::post_json(
        common::build_test_app(&store, ""),
        "/events",
        &json!({ "user_id": 0, "action": "click" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = common::get_json(
        common::build_test_app(&store, ""),
        "/events?from=2000-01-01&to=2100-01-01",
    )
    .await;
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_event_routes_mount_under_base_path() {
    let store = common::in_memory_store();

    let (status, _) = common::post_json(
        common::build_test_app(&store, "/api/v1"),
        "/api/v1/events",
        &json!({ "user_id": 1, "action": "click" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::get(
        common::build_test_app(&store, "/api/v1"),
        "/events?from=2026-01-15&to=2026-01-16",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingested_events_roll_up_into_buckets() {
    let store = common::in_memory_store();
    for (user_id, action) in [(1, "click"), (1, "view"), (2, "click")] {
        let (status, _) = common::post_json(
            common::build_test_app(&store, ""),
            "/events",
            &json!({ "user_id": user_id, "action": action }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let clock = FixedClock(common::fixed_now() + TimeDelta::seconds(30));

    let first = run_aggregation_tick(&*store, &clock, TimeDelta::seconds(60))
        .await
        .unwrap();
    let second = run_aggregation_tick(&*store, &clock, TimeDelta::seconds(60))
        .await
        .unwrap();

    assert_eq!(first.buckets_written, 2);
    assert_eq!(second.buckets_written, 2);
    let counts: Vec<(i64, i64)> = store
        .buckets()
        .iter()
        .map(|b| (b.user_id, b.event_count))
        .collect();
    assert_eq!(counts, vec![(1, 2), (2, 1)]);
}
