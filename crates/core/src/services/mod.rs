//! Business logic services.

#![allow(missing_docs)]

pub mod approval;
pub mod driver;
pub mod event;
pub mod event_publisher;
pub mod fleet;
pub mod reservation;
pub mod ride;
pub mod student;

pub use approval::{
    ApprovalStore, ApprovalWorkflow, DEFAULT_PENDING_LIMIT, DriverApplicationApprovalStore,
    DriverApprovalService, PaymentApprovalService, PaymentProofApprovalStore,
    StudentApprovalService, StudentApprovalStore,
};
pub use driver::{DriverApplicationInput, DriverService};
pub use event::{CreateEventInput, EventService};
pub use event_publisher::{
    ApprovalKind, EventPublisher, EventPublisherService, NoOpEventPublisher,
    TracingEventPublisher, TransportEvent,
};
pub use fleet::{CreateBusInput, CreateRouteInput, CreateScheduleInput, FleetService};
pub use reservation::{BusAvailability, ReservationService, ReserveSeatInput};
pub use ride::{PostRideInput, RideRequestDecision, RideService, validate_ride_input};
pub use student::{RegisterStudentInput, StudentService};
