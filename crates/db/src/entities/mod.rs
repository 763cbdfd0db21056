//! Database entities.

#![allow(missing_docs)]

pub mod bus;
pub mod bus_reservation;
pub mod driver_application;
pub mod event;
pub mod event_booking;
pub mod payment_proof;
pub mod ride;
pub mod ride_request;
pub mod route;
pub mod schedule;
pub mod student;

pub use bus::Entity as Bus;
pub use bus_reservation::Entity as BusReservation;
pub use driver_application::Entity as DriverApplication;
pub use event::Entity as Event;
pub use event_booking::Entity as EventBooking;
pub use payment_proof::Entity as PaymentProof;
pub use ride::Entity as Ride;
pub use ride_request::Entity as RideRequest;
pub use route::Entity as Route;
pub use schedule::Entity as Schedule;
pub use student::Entity as Student;
