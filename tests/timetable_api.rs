//! Integration tests for the timetable endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use common::{
    FlakyStore, body_json, build_app_with_store, build_demo_app, build_test_app, get, post_json,
};
use serde_json::json;

use class_scheduler::catalog::CatalogSnapshot;

// ---------------------------------------------------------------------------
// Test: health endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok() {
    let response = get(build_demo_app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

// ---------------------------------------------------------------------------
// Test: generation over the demo catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_schedules_every_demo_course() {
    let app = build_demo_app();

    let response = post_json(
        app.clone(),
        "/v1/timetable/generate",
        json!({"semester": 1, "academicYear": "2024-2025", "actorId": 1}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Timetable generation completed.");
    assert_eq!(json["log"]["status"], "success");
    assert_eq!(json["log"]["coursesScheduled"], 4);
    assert_eq!(json["log"]["conflictsResolved"], 4);
    assert_eq!(json["log"]["generatedBy"], 1);
    assert!(json["log"]["errorMessage"].is_null());

    let timetable = json["timetable"].as_array().unwrap();
    assert_eq!(timetable.len(), 4);
    assert_eq!(timetable[0]["course"], "CS101");
    assert_eq!(timetable[0]["room"], "Room 101");
    assert_eq!(timetable[0]["timeSlot"], "monday 09:00-10:30");

    let listed = body_json(get(app, "/v1/timetable?semester=1&academicYear=2024-2025").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn generate_uses_default_key_for_empty_body() {
    let app = build_demo_app();

    let response = post_json(app.clone(), "/v1/timetable/generate", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let listed = body_json(get(app, "/v1/timetable?semester=1&academicYear=2024-2025").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn generate_rejects_blank_academic_year() {
    let response = post_json(
        build_demo_app(),
        "/v1/timetable/generate",
        json!({"academicYear": "  "}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn generate_without_rooms_is_a_failed_run() {
    let catalog = CatalogSnapshot::from_json(
        r#"{
            "timeSlots": [{"id": 1, "day": "monday", "startTime": "09:00:00", "endTime": "10:00:00"}],
            "courses": [{"id": 1, "code": "CS101", "teacherId": 4, "studentIds": [7]}]
        }"#,
    )
    .unwrap();
    let app = build_test_app(catalog);

    let response = post_json(app.clone(), "/v1/timetable/generate", json!({"actorId": 1})).await;

    // Placement failures are a normal outcome, not a server error.
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["log"]["status"], "failed");
    assert_eq!(json["log"]["conflictsFound"], 1);
    assert_eq!(json["timetable"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Test: storage fault during generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn storage_fault_returns_500_and_keeps_previous_timetable() {
    let store = Arc::new(FlakyStore::new(CatalogSnapshot::demo(Utc::now())));
    let app = build_app_with_store(Arc::clone(&store));
    let body = json!({"semester": 1, "academicYear": "2024-2025", "actorId": 1});
    let first = post_json(app.clone(), "/v1/timetable/generate", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);

    store.set_fail_writes(true);
    let response = post_json(app.clone(), "/v1/timetable/generate", body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Timetable generation failed.");
    assert_eq!(json["log"]["status"], "failed");
    assert_eq!(json["log"]["errorMessage"], "storage unavailable: connection reset");
    assert!(json.get("timetable").is_none());

    let timetable =
        body_json(get(app, "/v1/timetable?semester=1&academicYear=2024-2025").await).await;
    assert_eq!(timetable.as_array().map(Vec::len), Some(4));
}

// ---------------------------------------------------------------------------
// Test: listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generation_logs_are_newest_first() {
    let app = build_demo_app();
    post_json(app.clone(), "/v1/timetable/generate", json!({"semester": 1, "actorId": 1})).await;
    post_json(app.clone(), "/v1/timetable/generate", json!({"semester": 2, "actorId": 2})).await;

    let logs = body_json(get(app, "/v1/timetable/generation-logs").await).await;

    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["generatedBy"], 2);
    assert_eq!(logs[1]["generatedBy"], 1);
}

#[tokio::test]
async fn timetable_can_be_filtered_by_teacher() {
    let app = build_demo_app();
    post_json(app.clone(), "/v1/timetable/generate", json!({})).await;

    let listed = body_json(get(app, "/v1/timetable?teacherId=3").await).await;

    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["course"], "CS201");
}

#[tokio::test]
async fn catalog_endpoints_list_rooms_and_slots_in_order() {
    let app = build_demo_app();

    let rooms = body_json(get(app.clone(), "/v1/rooms").await).await;
    let slots = body_json(get(app, "/v1/time-slots").await).await;

    assert_eq!(rooms.as_array().unwrap().len(), 5);
    assert_eq!(rooms[0]["name"], "Room 101");
    assert_eq!(slots.as_array().unwrap().len(), 20);
    assert_eq!(slots[0]["day"], "monday");
    assert_eq!(slots[19]["day"], "friday");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(build_demo_app(), "/v1/nothing-here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
