//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `unibus_test`)
//!   `TEST_DB_PASSWORD` (default: `unibus_test`)

#![allow(clippy::unwrap_used)]


use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use unibus_common::AppError;
use unibus_db::entities::{
    bus_reservation::{self, ReservationStatus},
    driver_application, ride, ride_request,
    ride_request::RideRequestStatus,
    student::ApprovalStatus,
};
use unibus_db::repositories::{BusReservationRepository, RideRequestRepository};
use unibus_db::test_utils::{TestDatabase, TestDbConfig, seed_bus, seed_student};

fn active_reservation(id: &str, student_id: &str, bus_id: &str) -> bus_reservation::ActiveModel {
    bus_reservation::ActiveModel {
        id: Set(id.to_string()),
        student_id: Set(student_id.to_string()),
        bus_id: Set(bus_id.to_string()),
        schedule_id: Set(None),
        status: Set(ReservationStatus::Active),
        created_at: Set(Utc::now().into()),
        cancelled_at: Set(None),
        cancelled_by: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_second_active_reservation_is_a_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection();
    seed_student(conn, "s1", ApprovalStatus::Approved).await.unwrap();
    seed_bus(conn, "b1", 10).await.unwrap();
    seed_bus(conn, "b2", 10).await.unwrap();

    let repo = BusReservationRepository::new(db.shared_connection().await.unwrap());
    repo.insert(conn, active_reservation("r1", "s1", "b1"))
        .await
        .unwrap();
    let second = repo.insert(conn, active_reservation("r2", "s1", "b2")).await;

    assert!(matches!(second, Err(AppError::Conflict(_))));

    // After cancelling, a new active reservation is allowed again
    repo.cancel_active("s1", "s1", Utc::now().into())
        .await
        .unwrap();
    repo.insert(conn, active_reservation("r3", "s1", "b2"))
        .await
        .unwrap();

    let counts = repo.occupancy_counts().await.unwrap();
    assert_eq!(counts.get("b2"), Some(&1));
    assert_eq!(counts.get("b1"), None);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_pending_ride_request_is_a_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection();
    seed_student(conn, "driver", ApprovalStatus::Approved).await.unwrap();
    seed_student(conn, "passenger", ApprovalStatus::Approved).await.unwrap();

    ride::ActiveModel {
        id: Set("ride1".to_string()),
        driver_id: Set("driver".to_string()),
        from_location: Set("ISPTEC".to_string()),
        to_location: Set("Talatona".to_string()),
        start_time: Set((Utc::now() + chrono::Duration::hours(2)).into()),
        end_time: Set(None),
        available_seats: Set(3),
        price: Set(0),
        description: Set(None),
        status: Set(ride::RideStatus::Available),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();

    let request = |id: &str| ride_request::ActiveModel {
        id: Set(id.to_string()),
        ride_id: Set("ride1".to_string()),
        passenger_id: Set("passenger".to_string()),
        status: Set(RideRequestStatus::Pending),
        message: Set(None),
        created_at: Set(Utc::now().into()),
        decided_at: Set(None),
    };

    let repo = RideRequestRepository::new(db.shared_connection().await.unwrap());
    repo.create(conn, request("q1")).await.unwrap();
    let duplicate = repo.create(conn, request("q2")).await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rejected_driver_application_requires_reason() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection();
    seed_student(conn, "s1", ApprovalStatus::Approved).await.unwrap();

    let application = |id: &str, reason: Option<&str>| driver_application::ActiveModel {
        id: Set(id.to_string()),
        student_id: Set("s1".to_string()),
        vehicle_make: Set("Toyota".to_string()),
        vehicle_model: Set("Corolla".to_string()),
        vehicle_color: Set("Branco".to_string()),
        vehicle_plate: Set("LD-12-34-AB".to_string()),
        status: Set(ApprovalStatus::Rejected),
        approved_by: Set(Some("admin1".to_string())),
        approved_at: Set(Some(Utc::now().into())),
        rejection_reason: Set(reason.map(str::to_string)),
        created_at: Set(Utc::now().into()),
    };

    assert!(application("a1", Some("  ")).insert(conn).await.is_err());
    assert!(application("a2", None).insert(conn).await.is_err());
    assert!(
        application("a3", Some("Matrícula ilegível"))
            .insert(conn)
            .await
            .is_ok()
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reservation_requires_existing_bus() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection();
    seed_student(conn, "s1", ApprovalStatus::Approved).await.unwrap();

    let repo = BusReservationRepository::new(db.shared_connection().await.unwrap());
    let result = repo
        .insert(conn, active_reservation("r1", "s1", "no-such-bus"))
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
