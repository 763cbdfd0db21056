//! Ride offer and seat request endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use unibus_common::AppResult;
use unibus_core::{PostRideInput, RideRequestDecision};
use unibus_db::entities::{
    ride, ride::RideStatus, ride_request, ride_request::RideRequestStatus,
};

use crate::{
    extractors::{ApprovedStudent, Caller},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Ride response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideResponse {
    pub id: String,
    pub driver_id: String,
    pub from_location: String,
    pub to_location: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub available_seats: i32,
    pub price: i64,
    pub description: Option<String>,
    pub status: RideStatus,
    pub created_at: String,
}

impl From<ride::Model> for RideResponse {
    fn from(r: ride::Model) -> Self {
        Self {
            id: r.id,
            driver_id: r.driver_id,
            from_location: r.from_location,
            to_location: r.to_location,
            start_time: r.start_time.to_rfc3339(),
            end_time: r.end_time.map(|t| t.to_rfc3339()),
            available_seats: r.available_seats,
            price: r.price,
            description: r.description,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Ride request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestResponse {
    pub id: String,
    pub ride_id: String,
    pub passenger_id: String,
    pub status: RideRequestStatus,
    pub message: Option<String>,
    pub created_at: String,
    pub decided_at: Option<String>,
}

impl From<ride_request::Model> for RideRequestResponse {
    fn from(r: ride_request::Model) -> Self {
        Self {
            id: r.id,
            ride_id: r.ride_id,
            passenger_id: r.passenger_id,
            status: r.status,
            message: r.message,
            created_at: r.created_at.to_rfc3339(),
            decided_at: r.decided_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Seat request.
#[derive(Debug, Default, Deserialize)]
pub struct RequestSeatRequest {
    pub message: Option<String>,
}

// ==================== Handlers ====================

async fn post_ride(
    student: ApprovedStudent,
    State(state): State<AppState>,
    Json(req): Json<PostRideInput>,
) -> AppResult<ApiResponse<RideResponse>> {
    let ride = state.ride_service.post_ride(&student.caller, req).await?;
    Ok(ApiResponse::created(ride.into()))
}

/// Upcoming available rides, earliest first.
async fn list_available(
    Caller(_caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RideResponse>>> {
    let rides = state.ride_service.list_available_rides(Utc::now()).await?;
    Ok(ApiResponse::ok(rides.into_iter().map(Into::into).collect()))
}

async fn list_mine(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RideResponse>>> {
    let rides = state
        .ride_service
        .list_rides_by_driver(&caller.identity)
        .await?;
    Ok(ApiResponse::ok(rides.into_iter().map(Into::into).collect()))
}

async fn request_seat(
    student: ApprovedStudent,
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
    Json(req): Json<RequestSeatRequest>,
) -> AppResult<ApiResponse<RideRequestResponse>> {
    let request = state
        .ride_service
        .request_seat(&student.caller, &ride_id, req.message)
        .await?;
    Ok(ApiResponse::created(request.into()))
}

/// The owner's inbox for one ride.
async fn list_requests(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
) -> AppResult<ApiResponse<Vec<RideRequestResponse>>> {
    let requests = state.ride_service.list_requests(&caller, &ride_id).await?;
    Ok(ApiResponse::ok(requests.into_iter().map(Into::into).collect()))
}

async fn cancel_ride(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
) -> AppResult<ApiResponse<RideResponse>> {
    let ride = state.ride_service.cancel_ride(&caller, &ride_id).await?;
    Ok(ApiResponse::ok(ride.into()))
}

async fn complete_ride(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
) -> AppResult<ApiResponse<RideResponse>> {
    let ride = state.ride_service.complete_ride(&caller, &ride_id).await?;
    Ok(ApiResponse::ok(ride.into()))
}

async fn accept_request(
    student: ApprovedStudent,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<ApiResponse<RideRequestResponse>> {
    let request = state
        .ride_service
        .decide_request(&student.caller, &request_id, RideRequestDecision::Accept)
        .await?;
    Ok(ApiResponse::ok(request.into()))
}

async fn reject_request(
    student: ApprovedStudent,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<ApiResponse<RideRequestResponse>> {
    let request = state
        .ride_service
        .decide_request(&student.caller, &request_id, RideRequestDecision::Reject)
        .await?;
    Ok(ApiResponse::ok(request.into()))
}

pub fn rides_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_available).post(post_ride))
        .route("/mine", get(list_mine))
        .route("/{id}/requests", get(list_requests).post(request_seat))
        .route("/{id}/cancel", post(cancel_ride))
        .route("/{id}/complete", post(complete_ride))
}

pub fn requests_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/accept", post(accept_request))
        .route("/{id}/reject", post(reject_request))
}
