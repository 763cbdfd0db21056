//! Core business logic for the unibus transport platform.
//!
//! Houses the Reservation Manager, the Ride Matching Manager and the shared
//! Approval Workflow, plus the fleet and event services around them. Every
//! operation receives an explicit [`CallerContext`].

pub mod context;
pub mod services;

pub use context::{CallerContext, Role};
pub use services::*;
