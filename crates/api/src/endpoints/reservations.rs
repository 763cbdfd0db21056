//! Bus seat reservation endpoints.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Serialize;
use unibus_common::AppResult;
use unibus_core::ReserveSeatInput;
use unibus_db::entities::{bus_reservation, bus_reservation::ReservationStatus};

use crate::{
    extractors::{AdminCaller, ApprovedStudent, Caller},
    middleware::AppState,
    response::{ApiResponse, empty_ok},
};

/// Reservation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: String,
    pub student_id: String,
    pub bus_id: String,
    pub schedule_id: Option<String>,
    pub status: ReservationStatus,
    pub created_at: String,
    pub cancelled_at: Option<String>,
    pub cancelled_by: Option<String>,
}

impl From<bus_reservation::Model> for ReservationResponse {
    fn from(r: bus_reservation::Model) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            bus_id: r.bus_id,
            schedule_id: r.schedule_id,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
            cancelled_at: r.cancelled_at.map(|t| t.to_rfc3339()),
            cancelled_by: r.cancelled_by,
        }
    }
}

/// Reserve a seat for the caller.
async fn reserve(
    student: ApprovedStudent,
    State(state): State<AppState>,
    Json(req): Json<ReserveSeatInput>,
) -> AppResult<ApiResponse<ReservationResponse>> {
    let reservation = state
        .reservation_service
        .reserve_seat(&student.caller, req)
        .await?;
    Ok(ApiResponse::created(reservation.into()))
}

/// The caller's active reservation, or `null`.
async fn mine(
    student: ApprovedStudent,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Option<ReservationResponse>>> {
    let reservation = state
        .reservation_service
        .get_active_reservation(&student.caller)
        .await?;
    Ok(ApiResponse::ok(reservation.map(Into::into)))
}

/// Cancel the caller's active reservation. Idempotent.
async fn cancel_mine(
    student: ApprovedStudent,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state
        .reservation_service
        .cancel_reservation(&student.caller)
        .await?;
    Ok(empty_ok())
}

/// Active reservations per bus.
async fn counts(
    Caller(_caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<HashMap<String, u64>>> {
    let counts = state.reservation_service.get_occupancy_counts().await?;
    Ok(ApiResponse::ok(counts))
}

/// Admin override: cancel a student's active reservation.
async fn cancel_for_student(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .reservation_service
        .cancel_reservation_for(&admin, &student_id)
        .await?;
    Ok(empty_ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(reserve))
        .route("/mine", get(mine).delete(cancel_mine))
        .route("/counts", get(counts))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/{student_id}", delete(cancel_for_student))
}
