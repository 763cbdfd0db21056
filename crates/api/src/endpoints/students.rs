//! Student registration and approval endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use unibus_common::AppResult;
use unibus_core::{DEFAULT_PENDING_LIMIT, RegisterStudentInput};
use unibus_db::entities::{student, student::ApprovalStatus};

use crate::{
    extractors::{AdminCaller, Caller},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Student response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: String,
    pub full_name: String,
    pub student_number: String,
    pub university: String,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub is_driver: bool,
    pub qr_code: Option<String>,
    pub created_at: String,
}

impl From<student::Model> for StudentResponse {
    fn from(s: student::Model) -> Self {
        let is_driver = s.is_driver();
        Self {
            id: s.id,
            full_name: s.full_name,
            student_number: s.student_number,
            university: s.university,
            approval_status: s.approval_status,
            approved_by: s.approved_by,
            approved_at: s.approved_at.map(|t| t.to_rfc3339()),
            rejection_reason: s.rejection_reason,
            is_driver,
            qr_code: s.qr_code,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

/// Pending queue pagination.
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Reject request.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Missing and blank reasons are both refused by the workflow.
    #[serde(default)]
    pub reason: String,
}

pub(crate) const fn default_limit() -> u64 {
    DEFAULT_PENDING_LIMIT
}

// ==================== Handlers ====================

/// Register the caller as a student.
async fn register(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(req): Json<RegisterStudentInput>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state.student_service.register(&caller, req).await?;
    Ok(ApiResponse::created(student.into()))
}

/// The caller's profile, including approval state and QR code.
async fn me(
    Caller(caller): Caller,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state.student_service.get_me(&caller).await?;
    Ok(ApiResponse::ok(student.into()))
}

/// Registrations awaiting a decision, oldest first.
async fn pending(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> AppResult<ApiResponse<Vec<StudentResponse>>> {
    let students = state
        .student_approvals
        .get_pending(&admin, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(students.into_iter().map(Into::into).collect()))
}

async fn approve(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state.student_approvals.approve(&admin, &id).await?;
    Ok(ApiResponse::ok(student.into()))
}

async fn reject(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state
        .student_approvals
        .reject(&admin, &id, &req.reason)
        .await?;
    Ok(ApiResponse::ok(student.into()))
}

/// Boarding check: resolve a scanned QR code.
async fn by_qr(
    AdminCaller(admin): AdminCaller,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<StudentResponse>> {
    let student = state.student_service.find_by_qr(&admin, &code).await?;
    Ok(ApiResponse::ok(student.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/me", get(me))
        .route("/pending", get(pending))
        .route("/by-qr/{code}", get(by_qr))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
}
