//! End-to-end service flows against a real database.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p unibus-core --test transport_flows -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use unibus_common::{AppError, QR_CODE_PREFIX};
use unibus_core::{
    ApprovalWorkflow, CallerContext, PostRideInput, RegisterStudentInput, ReservationService,
    ReserveSeatInput, RideRequestDecision, RideService, StudentApprovalStore, StudentService,
};
use unibus_db::entities::{ride_request::RideRequestStatus, student::ApprovalStatus};
use unibus_db::repositories::{
    BusRepository, BusReservationRepository, RideRepository, RideRequestRepository,
    ScheduleRepository, StudentRepository,
};
use unibus_db::test_utils::{TestDatabase, seed_bus, seed_student};

fn reservation_service(db: &Arc<DatabaseConnection>) -> ReservationService {
    ReservationService::new(
        db.clone(),
        BusReservationRepository::new(db.clone()),
        BusRepository::new(db.clone()),
        StudentRepository::new(db.clone()),
        ScheduleRepository::new(db.clone()),
    )
}

fn ride_service(db: &Arc<DatabaseConnection>) -> RideService {
    RideService::new(
        db.clone(),
        RideRepository::new(db.clone()),
        RideRequestRepository::new(db.clone()),
        StudentRepository::new(db.clone()),
    )
}

fn reserve(bus_id: &str) -> ReserveSeatInput {
    ReserveSeatInput {
        bus_id: bus_id.to_string(),
        schedule_id: None,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_register_approve_reserve_and_fill_bus() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();
    seed_bus(db.as_ref(), "b1", 1).await.unwrap();
    seed_student(db.as_ref(), "s2", ApprovalStatus::Approved)
        .await
        .unwrap();

    let students = StudentService::new(StudentRepository::new(db.clone()));
    let approvals = ApprovalWorkflow::new(StudentApprovalStore::new(
        db.clone(),
        StudentRepository::new(db.clone()),
    ));
    let reservations = reservation_service(&db);

    let s1 = CallerContext::student("s1");
    let registered = students
        .register(
            &s1,
            RegisterStudentInput {
                full_name: "Ana Silva".to_string(),
                student_number: "20240001".to_string(),
                university: "ISPTEC".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(registered.approval_status, ApprovalStatus::Pending);

    let approved = approvals
        .approve(&CallerContext::admin("admin1"), "s1")
        .await
        .unwrap();
    assert_eq!(approved.approval_status, ApprovalStatus::Approved);
    assert!(approved.qr_code.unwrap().starts_with(QR_CODE_PREFIX));

    reservations.reserve_seat(&s1, reserve("b1")).await.unwrap();
    assert_eq!(reservations.get_occupancy_counts().await.unwrap().get("b1"), Some(&1));

    let s2 = CallerContext::student("s2");
    let full = reservations.reserve_seat(&s2, reserve("b1")).await;
    assert!(matches!(full, Err(AppError::CapacityExceeded(_))));

    reservations.cancel_reservation(&s1).await.unwrap();
    reservations.reserve_seat(&s2, reserve("b1")).await.unwrap();

    let availability = reservations.list_bus_availability().await.unwrap();
    assert_eq!(availability.len(), 1);
    assert_eq!(availability[0].available, 0);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_reservations_for_last_seat() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();
    seed_bus(db.as_ref(), "b1", 1).await.unwrap();
    seed_student(db.as_ref(), "s1", ApprovalStatus::Approved)
        .await
        .unwrap();
    seed_student(db.as_ref(), "s2", ApprovalStatus::Approved)
        .await
        .unwrap();

    let service = reservation_service(&db);
    let first = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .reserve_seat(&CallerContext::student("s1"), reserve("b1"))
                .await
        })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .reserve_seat(&CallerContext::student("s2"), reserve("b1"))
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::CapacityExceeded(_))))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(rejected, 1);
    assert_eq!(service.get_occupancy_counts().await.unwrap().get("b1"), Some(&1));

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ride_fills_up_and_cancel_rejects_pending() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();
    for id in ["driver", "p1", "p2", "p3"] {
        seed_student(db.as_ref(), id, ApprovalStatus::Approved)
            .await
            .unwrap();
    }

    let rides = ride_service(&db);
    let driver = CallerContext::student("driver");
    let ride = rides
        .post_ride(
            &driver,
            PostRideInput {
                from_location: "ISPTEC".to_string(),
                to_location: "Talatona".to_string(),
                start_time: (Utc::now() + Duration::hours(4)).to_rfc3339(),
                end_time: None,
                available_seats: 2,
                price: 0,
                description: Some("Saída do portão principal".to_string()),
            },
        )
        .await
        .unwrap();

    let mut requests = Vec::new();
    for passenger in ["p1", "p2", "p3"] {
        let request = rides
            .request_seat(&CallerContext::student(passenger), &ride.id, None)
            .await
            .unwrap();
        requests.push(request);
    }

    for request in &requests[..2] {
        let decided = rides
            .decide_request(&driver, &request.id, RideRequestDecision::Accept)
            .await
            .unwrap();
        assert_eq!(decided.status, RideRequestStatus::Accepted);
    }

    let third = rides
        .decide_request(&driver, &requests[2].id, RideRequestDecision::Accept)
        .await;
    assert!(matches!(third, Err(AppError::CapacityExceeded(_))));

    rides.cancel_ride(&driver, &ride.id).await.unwrap();

    let inbox = rides.list_requests(&driver, &ride.id).await.unwrap();
    let third = inbox.iter().find(|r| r.id == requests[2].id).unwrap();
    assert_eq!(third.status, RideRequestStatus::Rejected);

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_request_racing_cancel_never_stays_pending() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    let db = test_db.shared_connection().await.unwrap();
    for id in ["driver", "p1"] {
        seed_student(db.as_ref(), id, ApprovalStatus::Approved)
            .await
            .unwrap();
    }

    let rides = ride_service(&db);
    let driver = CallerContext::student("driver");

    for _ in 0..50 {
        let ride = rides
            .post_ride(
                &driver,
                PostRideInput {
                    from_location: "Kilamba".to_string(),
                    to_location: "ISPTEC".to_string(),
                    start_time: (Utc::now() + Duration::hours(2)).to_rfc3339(),
                    end_time: None,
                    available_seats: 3,
                    price: 500,
                    description: None,
                },
            )
            .await
            .unwrap();

        let request = {
            let rides = rides.clone();
            let ride_id = ride.id.clone();
            tokio::spawn(async move {
                rides
                    .request_seat(&CallerContext::student("p1"), &ride_id, None)
                    .await
            })
        };
        let cancel = {
            let rides = rides.clone();
            let driver = driver.clone();
            let ride_id = ride.id.clone();
            tokio::spawn(async move { rides.cancel_ride(&driver, &ride_id).await })
        };

        // The request either lands first and is rejected by the cascade,
        // or sees the cancelled ride and is refused.
        let requested = request.await.unwrap();
        cancel.await.unwrap().unwrap();
        if let Err(e) = requested {
            assert!(matches!(e, AppError::Conflict(_)));
        }

        let inbox = rides.list_requests(&driver, &ride.id).await.unwrap();
        assert!(inbox.iter().all(|r| r.status != RideRequestStatus::Pending));
    }

    test_db.drop_database().await.unwrap();
}
