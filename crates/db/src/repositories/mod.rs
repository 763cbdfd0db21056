//! Repositories wrapping sea-orm queries for each aggregate.
//!
//! Read helpers run against the pooled connection. Methods taking a `conn`
//! argument are meant to run inside a caller-owned transaction.

mod bus;
mod bus_reservation;
mod driver_application;
mod event;
mod event_booking;
mod payment_proof;
mod ride;
mod ride_request;
mod route;
mod schedule;
mod student;

pub use bus::BusRepository;
pub use bus_reservation::{BusOccupancy, BusReservationRepository};
pub use driver_application::DriverApplicationRepository;
pub use event::EventRepository;
pub use event_booking::EventBookingRepository;
pub use payment_proof::PaymentProofRepository;
pub use ride::RideRepository;
pub use ride_request::RideRequestRepository;
pub use route::RouteRepository;
pub use schedule::ScheduleRepository;
pub use student::{StudentRepository, VehicleDescriptor};

use crate::entities::student::ApprovalStatus;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Field values written when an admin decides a pending approval entity.
#[derive(Debug, Clone)]
pub struct ApprovalChange {
    /// Target status, `Approved` or `Rejected`.
    pub status: ApprovalStatus,
    /// Admin identity recorded as the decider.
    pub decided_by: String,
    /// Rejection reason, already trimmed.
    pub reason: Option<String>,
    /// Decision timestamp.
    pub decided_at: DateTimeWithTimeZone,
}
