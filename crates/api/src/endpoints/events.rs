//! Event transport endpoints: events, bookings and payment proofs.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use unibus_common::AppResult;
use unibus_core::CreateEventInput;
use unibus_db::entities::{
    event, event_booking,
    event_booking::{PaymentStatus, TripType},
    payment_proof,
    student::ApprovalStatus,
};

use super::students::{PendingQuery, RejectRequest};
use crate::{
    extractors::{AdminCaller, Caller},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub venue: String,
    pub event_date: String,
    pub fee_one_way: i64,
    pub fee_return_only: i64,
    pub fee_round_trip: i64,
    pub is_active: bool,
}

impl From<event::Model> for EventResponse {
    fn from(e: event::Model) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            venue: e.venue,
            event_date: e.event_date.to_rfc3339(),
            fee_one_way: e.fee_one_way,
            fee_return_only: e.fee_return_only,
            fee_round_trip: e.fee_round_trip,
            is_active: e.is_active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub event_id: String,
    pub student_id: String,
    pub trip_type: TripType,
    pub price: i64,
    pub payment_status: PaymentStatus,
    pub created_at: String,
}

impl From<event_booking::Model> for BookingResponse {
    fn from(b: event_booking::Model) -> Self {
        Self {
            id: b.id,
            event_id: b.event_id,
            student_id: b.student_id,
            trip_type: b.trip_type,
            price: b.price,
            payment_status: b.payment_status,
            created_at: b.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofResponse {
    pub id: String,
    pub booking_id: String,
    pub file_reference: String,
    pub status: ApprovalStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

impl From<payment_proof::Model> for PaymentProofResponse {
    fn from(p: payment_proof::Model) -> Self {
        Self {
            id: p.id,
            booking_id: p.booking_id,
            file_reference: p.file_reference,
            status: p.status,
            approved_by: p.approved_by,
            approved_at: p.approved_at.map(|t| t.to_rfc3339()),
            rejection_reason: p.rejection_reason,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub trip_type: TripType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofRequest {
    #[serde(default)]
    pub file_reference: String,
}

// ==================== Handlers ====================

async fn list_upcoming(
    Caller(_caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let events = state.event_service.list_upcoming(Utc::now()).await?;
    Ok(ApiResponse::ok(events.into_iter().map(Into::into).collect()))
}

async fn create_event(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Json(req): Json<CreateEventInput>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.create_event(&admin, req).await?;
    Ok(ApiResponse::created(event.into()))
}

async fn book(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<BookRequest>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let booking = state
        .event_service
        .book(&caller, &event_id, req.trip_type)
        .await?;
    Ok(ApiResponse::created(booking.into()))
}

async fn my_bookings(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<BookingResponse>>> {
    let bookings = state.event_service.list_my_bookings(&caller).await?;
    Ok(ApiResponse::ok(bookings.into_iter().map(Into::into).collect()))
}

async fn submit_payment_proof(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(req): Json<PaymentProofRequest>,
) -> AppResult<ApiResponse<PaymentProofResponse>> {
    let proof = state
        .event_service
        .submit_payment_proof(&caller, &booking_id, &req.file_reference)
        .await?;
    Ok(ApiResponse::created(proof.into()))
}

async fn pending_proofs(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> AppResult<ApiResponse<Vec<PaymentProofResponse>>> {
    let proofs = state
        .payment_approvals
        .get_pending(&admin, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(proofs.into_iter().map(Into::into).collect()))
}

async fn approve_proof(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PaymentProofResponse>> {
    let proof = state.payment_approvals.approve(&admin, &id).await?;
    Ok(ApiResponse::ok(proof.into()))
}

async fn reject_proof(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<PaymentProofResponse>> {
    let proof = state
        .payment_approvals
        .reject(&admin, &id, &req.reason)
        .await?;
    Ok(ApiResponse::ok(proof.into()))
}

pub fn events_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_upcoming).post(create_event))
        .route("/{id}/bookings", post(book))
}

pub fn bookings_router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(my_bookings))
        .route("/{id}/payment-proof", post(submit_payment_proof))
}

pub fn payment_proofs_router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending_proofs))
        .route("/{id}/approve", post(approve_proof))
        .route("/{id}/reject", post(reject_proof))
}
