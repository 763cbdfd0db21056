//! API endpoints.

#![allow(missing_docs)]

mod drivers;
mod events;
mod fleet;
mod health;
mod reservations;
mod rides;
mod students;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/students", students::router())
        .nest("/reservations", reservations::router())
        .nest("/admin/reservations", reservations::admin_router())
        .nest("/buses", fleet::buses_router())
        .nest("/routes", fleet::routes_router())
        .nest("/schedules", fleet::schedules_router())
        .nest("/rides", rides::rides_router())
        .nest("/ride-requests", rides::requests_router())
        .nest("/drivers", drivers::router())
        .nest("/events", events::events_router())
        .nest("/event-bookings", events::bookings_router())
        .nest("/payment-proofs", events::payment_proofs_router())
}
