//! Driver elevation endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Serialize;
use unibus_common::AppResult;
use unibus_core::DriverApplicationInput;
use unibus_db::entities::{driver_application, student::ApprovalStatus};

use super::students::{PendingQuery, RejectRequest};
use crate::{
    extractors::{AdminCaller, ApprovedStudent},
    middleware::AppState,
    response::ApiResponse,
};

/// Driver application response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverApplicationResponse {
    pub id: String,
    pub student_id: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_plate: String,
    pub status: ApprovalStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

impl From<driver_application::Model> for DriverApplicationResponse {
    fn from(a: driver_application::Model) -> Self {
        Self {
            id: a.id,
            student_id: a.student_id,
            vehicle_make: a.vehicle_make,
            vehicle_model: a.vehicle_model,
            vehicle_color: a.vehicle_color,
            vehicle_plate: a.vehicle_plate,
            status: a.status,
            approved_by: a.approved_by,
            approved_at: a.approved_at.map(|t| t.to_rfc3339()),
            rejection_reason: a.rejection_reason,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

async fn apply(
    student: ApprovedStudent,
    State(state): State<AppState>,
    Json(req): Json<DriverApplicationInput>,
) -> AppResult<ApiResponse<DriverApplicationResponse>> {
    let application = state.driver_service.apply(&student.caller, req).await?;
    Ok(ApiResponse::created(application.into()))
}

async fn pending(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> AppResult<ApiResponse<Vec<DriverApplicationResponse>>> {
    let applications = state
        .driver_approvals
        .get_pending(&admin, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(applications.into_iter().map(Into::into).collect()))
}

async fn approve(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DriverApplicationResponse>> {
    let application = state.driver_approvals.approve(&admin, &id).await?;
    Ok(ApiResponse::ok(application.into()))
}

async fn reject(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<DriverApplicationResponse>> {
    let application = state
        .driver_approvals
        .reject(&admin, &id, &req.reason)
        .await?;
    Ok(ApiResponse::ok(application.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", post(apply))
        .route("/applications/pending", get(pending))
        .route("/applications/{id}/approve", post(approve))
        .route("/applications/{id}/reject", post(reject))
}
