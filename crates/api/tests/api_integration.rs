//! API integration tests.
//!
//! These tests drive the full router, identity middleware included, over a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, Value};
use serde_json::Value as Json;
use tower::ServiceExt;
use unibus_api::{AppState, identity_middleware, router as api_router};
use unibus_db::entities::{bus, bus_reservation, student, student::ApprovalStatus};

fn create_test_router(db: MockDatabase) -> Router {
    let state = AppState::new(Arc::new(db.into_connection()), None);
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(identity_middleware))
        .with_state(state)
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn create_test_student(id: &str, status: ApprovalStatus) -> student::Model {
    student::Model {
        id: id.to_string(),
        account_id: id.to_string(),
        full_name: "Ana Silva".to_string(),
        student_number: "20240001".to_string(),
        university: "ISPTEC".to_string(),
        approval_status: status,
        approved_by: None,
        approved_at: None,
        rejection_reason: None,
        vehicle_make: None,
        vehicle_model: None,
        vehicle_color: None,
        vehicle_plate: None,
        qr_code: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn create_test_bus(id: &str, capacity: i32) -> bus::Model {
    bus::Model {
        id: id.to_string(),
        number: "UB-01".to_string(),
        capacity,
        is_active: true,
        route_id: None,
        created_at: Utc::now().into(),
    }
}

fn request(method: &str, uri: &str, caller: Option<(&str, &str)>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    if let Some((id, role)) = caller {
        builder = builder
            .header("x-caller-id", id)
            .header("x-caller-role", role);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Json {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("GET", "/api/health", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_returns_401() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("GET", "/api/students/me", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_role_returns_400() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("GET", "/api/students/me", Some(("s1", "root")), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pending_student_cannot_reserve() {
    let db = empty_db().append_query_results([[create_test_student(
        "s1",
        ApprovalStatus::Pending,
    )]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "POST",
            "/api/reservations",
            Some(("s1", "student")),
            r#"{"busId":"b1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_reserve_on_full_bus_returns_capacity_exceeded() {
    let db = empty_db()
        // approved-student gate
        .append_query_results([[create_test_student("s1", ApprovalStatus::Approved)]])
        // locked student row
        .append_query_results([[create_test_student("s1", ApprovalStatus::Approved)]])
        .append_query_results([Vec::<bus_reservation::Model>::new()])
        .append_query_results([[create_test_bus("b1", 1)]])
        .append_query_results([[maplit::btreemap! { "num_items" => Value::BigInt(Some(1)) }]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "POST",
            "/api/reservations",
            Some(("s1", "student")),
            r#"{"busId":"b1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "CAPACITY_EXCEEDED");
}

#[tokio::test]
async fn test_cancel_without_reservation_returns_empty_object() {
    let db = empty_db()
        .append_query_results([[create_test_student("s1", ApprovalStatus::Approved)]])
        .append_query_results([Vec::<bus_reservation::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "DELETE",
            "/api/reservations/mine",
            Some(("s1", "student")),
            "",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({}));
}

#[tokio::test]
async fn test_reject_with_empty_reason_returns_400() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request(
            "POST",
            "/api/students/s1/reject",
            Some(("admin1", "admin")),
            r#"{"reason":"  "}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_student_cannot_approve() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request(
            "POST",
            "/api/students/s2/approve",
            Some(("s1", "student")),
            "",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_requests_for_unknown_ride_returns_404() {
    let db = empty_db().append_query_results([Vec::<unibus_db::entities::ride::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "GET",
            "/api/rides/nope/requests",
            Some(("s1", "student")),
            "",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_me_returns_profile() {
    let db = empty_db().append_query_results([[create_test_student("s1", ApprovalStatus::Pending)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/api/students/me", Some(("s1", "student")), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["approvalStatus"], "pending");
    assert_eq!(body["data"]["isDriver"], false);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("GET", "/api/nonexistent", Some(("s1", "student")), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
