//! HTTP API layer for unibus.
//!
//! - **Endpoints**: students, reservations, rides, drivers, fleet and events
//! - **Extractors**: caller identity, admin gate, approved-student gate
//! - **Middleware**: identity headers from the upstream auth proxy
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, identity_middleware};
