//! Fleet endpoints: routes, buses and schedules.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use unibus_common::AppResult;
use unibus_core::{BusAvailability, CreateBusInput, CreateRouteInput, CreateScheduleInput};
use unibus_db::entities::{bus, route, schedule};

use crate::{
    extractors::{AdminCaller, Caller},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub id: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
}

impl From<route::Model> for RouteResponse {
    fn from(r: route::Model) -> Self {
        Self {
            id: r.id,
            name: r.name,
            origin: r.origin,
            destination: r.destination,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusResponse {
    pub id: String,
    pub number: String,
    pub capacity: i32,
    pub is_active: bool,
    pub route_id: Option<String>,
}

impl From<bus::Model> for BusResponse {
    fn from(b: bus::Model) -> Self {
        Self {
            id: b.id,
            number: b.number,
            capacity: b.capacity,
            is_active: b.is_active,
            route_id: b.route_id,
        }
    }
}

/// Bus with live occupancy.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusAvailabilityResponse {
    #[serde(flatten)]
    pub bus: BusResponse,
    pub occupied: u64,
    pub available: u64,
}

impl From<BusAvailability> for BusAvailabilityResponse {
    fn from(a: BusAvailability) -> Self {
        Self {
            bus: a.bus.into(),
            occupied: a.occupied,
            available: a.available,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: String,
    pub route_id: String,
    pub bus_id: Option<String>,
    pub day_of_week: i16,
    /// `HH:MM`
    pub departure_time: String,
    pub is_active: bool,
}

impl From<schedule::Model> for ScheduleResponse {
    fn from(s: schedule::Model) -> Self {
        Self {
            id: s.id,
            route_id: s.route_id,
            bus_id: s.bus_id,
            day_of_week: s.day_of_week,
            departure_time: s.departure_time.format("%H:%M").to_string(),
            is_active: s.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

// ==================== Handlers ====================

async fn create_route(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Json(req): Json<CreateRouteInput>,
) -> AppResult<ApiResponse<RouteResponse>> {
    let route = state.fleet_service.create_route(&admin, req).await?;
    Ok(ApiResponse::created(route.into()))
}

async fn list_routes(
    Caller(_caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RouteResponse>>> {
    let routes = state.fleet_service.list_routes().await?;
    Ok(ApiResponse::ok(routes.into_iter().map(Into::into).collect()))
}

async fn list_schedules(
    Caller(_caller): Caller,
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> AppResult<ApiResponse<Vec<ScheduleResponse>>> {
    let schedules = state.fleet_service.list_schedules(&route_id).await?;
    Ok(ApiResponse::ok(schedules.into_iter().map(Into::into).collect()))
}

async fn create_schedule(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleInput>,
) -> AppResult<ApiResponse<ScheduleResponse>> {
    let schedule = state.fleet_service.create_schedule(&admin, req).await?;
    Ok(ApiResponse::created(schedule.into()))
}

/// Active buses with seats taken and left.
async fn list_buses(
    Caller(_caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<BusAvailabilityResponse>>> {
    let buses = state.reservation_service.list_bus_availability().await?;
    Ok(ApiResponse::ok(buses.into_iter().map(Into::into).collect()))
}

async fn create_bus(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Json(req): Json<CreateBusInput>,
) -> AppResult<ApiResponse<BusResponse>> {
    let bus = state.fleet_service.create_bus(&admin, req).await?;
    Ok(ApiResponse::created(bus.into()))
}

async fn set_bus_active(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<ApiResponse<BusResponse>> {
    let bus = state
        .fleet_service
        .set_bus_active(&admin, &id, req.is_active)
        .await?;
    Ok(ApiResponse::ok(bus.into()))
}

pub fn routes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(create_route))
        .route("/{id}/schedules", get(list_schedules))
}

pub fn buses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_buses).post(create_bus))
        .route("/{id}/active", post(set_bus_active))
}

pub fn schedules_router() -> Router<AppState> {
    Router::new().route("/", post(create_schedule))
}
