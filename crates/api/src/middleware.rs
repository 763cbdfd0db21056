//! API middleware and shared state.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use unibus_common::{AppError, AppResult};
use unibus_core::{
    ApprovalWorkflow, CallerContext, DriverApplicationApprovalStore, DriverApprovalService,
    DriverService, EventPublisherService, EventService, FleetService, PaymentApprovalService,
    PaymentProofApprovalStore, ReservationService, RideService, Role, StudentApprovalService,
    StudentApprovalStore, StudentService,
};
use unibus_db::repositories::{
    BusRepository, BusReservationRepository, DriverApplicationRepository, EventBookingRepository,
    EventRepository, PaymentProofRepository, RideRepository, RideRequestRepository,
    RouteRepository, ScheduleRepository, StudentRepository,
};

/// Header carrying the authenticated account identity.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
/// Header carrying the caller's role (`student` or `admin`).
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
    pub reservation_service: ReservationService,
    pub ride_service: RideService,
    pub driver_service: DriverService,
    pub fleet_service: FleetService,
    pub event_service: EventService,
    pub student_approvals: StudentApprovalService,
    pub driver_approvals: DriverApprovalService,
    pub payment_approvals: PaymentApprovalService,
}

impl AppState {
    /// Wire every service over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, event_publisher: Option<EventPublisherService>) -> Self {
        let student_repo = StudentRepository::new(Arc::clone(&db));
        let bus_repo = BusRepository::new(Arc::clone(&db));
        let route_repo = RouteRepository::new(Arc::clone(&db));
        let schedule_repo = ScheduleRepository::new(Arc::clone(&db));
        let reservation_repo = BusReservationRepository::new(Arc::clone(&db));
        let ride_repo = RideRepository::new(Arc::clone(&db));
        let ride_request_repo = RideRequestRepository::new(Arc::clone(&db));
        let application_repo = DriverApplicationRepository::new(Arc::clone(&db));
        let event_repo = EventRepository::new(Arc::clone(&db));
        let booking_repo = EventBookingRepository::new(Arc::clone(&db));
        let proof_repo = PaymentProofRepository::new(Arc::clone(&db));

        let mut reservation_service = ReservationService::new(
            Arc::clone(&db),
            reservation_repo,
            bus_repo.clone(),
            student_repo.clone(),
            schedule_repo.clone(),
        );
        let mut ride_service = RideService::new(
            Arc::clone(&db),
            ride_repo,
            ride_request_repo,
            student_repo.clone(),
        );
        let mut student_approvals = ApprovalWorkflow::new(StudentApprovalStore::new(
            Arc::clone(&db),
            student_repo.clone(),
        ));
        let mut driver_approvals = ApprovalWorkflow::new(DriverApplicationApprovalStore::new(
            Arc::clone(&db),
            application_repo.clone(),
            student_repo.clone(),
        ));
        let mut payment_approvals = ApprovalWorkflow::new(PaymentProofApprovalStore::new(
            Arc::clone(&db),
            proof_repo.clone(),
            booking_repo.clone(),
        ));

        if let Some(publisher) = event_publisher {
            reservation_service.set_event_publisher(publisher.clone());
            ride_service.set_event_publisher(publisher.clone());
            student_approvals.set_event_publisher(publisher.clone());
            driver_approvals.set_event_publisher(publisher.clone());
            payment_approvals.set_event_publisher(publisher);
        }

        Self {
            student_service: StudentService::new(student_repo.clone()),
            reservation_service,
            ride_service,
            driver_service: DriverService::new(application_repo, student_repo),
            fleet_service: FleetService::new(route_repo, bus_repo, schedule_repo),
            event_service: EventService::new(db, event_repo, booking_repo, proof_repo),
            student_approvals,
            driver_approvals,
            payment_approvals,
        }
    }
}

/// Identity middleware.
///
/// Reads the identity headers set by the upstream auth proxy into a
/// [`CallerContext`] request extension. Requests without an identity pass
/// through untouched; extractors decide whether that is acceptable.
pub async fn identity_middleware(mut req: Request<Body>, next: Next) -> Response {
    match caller_from_headers(req.headers()) {
        Ok(Some(caller)) => {
            tracing::debug!(caller_id = %caller.identity, role = %caller.role, "Caller identified");
            req.extensions_mut().insert(caller);
        }
        Ok(None) => {}
        Err(e) => return e.into_response(),
    }

    next.run(req).await
}

fn caller_from_headers(headers: &HeaderMap) -> AppResult<Option<CallerContext>> {
    let Some(identity) = headers
        .get(CALLER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };

    let role = match headers.get(CALLER_ROLE_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid caller role header".to_string()))?
            .parse::<Role>()?,
        None => Role::Student,
    };

    Ok(Some(CallerContext::new(identity, role)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_identity_is_anonymous() {
        assert!(caller_from_headers(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_role_defaults_to_student() {
        let mut headers = HeaderMap::new();
        headers.insert(CALLER_ID_HEADER, HeaderValue::from_static("s1"));

        let caller = caller_from_headers(&headers).unwrap().unwrap();
        assert_eq!(caller.identity, "s1");
        assert_eq!(caller.role, Role::Student);
    }

    #[test]
    fn test_admin_role() {
        let mut headers = HeaderMap::new();
        headers.insert(CALLER_ID_HEADER, HeaderValue::from_static("admin1"));
        headers.insert(CALLER_ROLE_HEADER, HeaderValue::from_static("admin"));

        let caller = caller_from_headers(&headers).unwrap().unwrap();
        assert!(caller.is_admin());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(CALLER_ID_HEADER, HeaderValue::from_static("s1"));
        headers.insert(CALLER_ROLE_HEADER, HeaderValue::from_static("root"));

        assert!(matches!(
            caller_from_headers(&headers),
            Err(AppError::BadRequest(_))
        ));
    }
}
