//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use unibus_common::AppError;
use unibus_core::CallerContext;
use unibus_db::entities::{student, student::ApprovalStatus};

use crate::middleware::AppState;

/// Authenticated caller extractor.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by identity middleware
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .map(Caller)
            .ok_or(AppError::Unauthorized)
    }
}

/// Caller holding the admin capability.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub CallerContext);

impl<S> FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Caller(caller) = Caller::from_request_parts(parts, state).await?;
        caller.require_admin()?;
        Ok(Self(caller))
    }
}

/// Caller whose student registration has been approved.
///
/// Reservation and ride endpoints sit behind this gate.
#[derive(Debug, Clone)]
pub struct ApprovedStudent {
    /// Caller identity.
    pub caller: CallerContext,
    /// The caller's approved student record.
    pub student: student::Model,
}

impl FromRequestParts<AppState> for ApprovedStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Caller(caller) = Caller::from_request_parts(parts, state).await?;

        let student = state
            .student_service
            .find_by_id(&caller.identity)
            .await?
            .ok_or_else(|| AppError::Forbidden("Registo de estudante necessário".to_string()))?;

        match student.approval_status {
            ApprovalStatus::Approved => Ok(Self { caller, student }),
            ApprovalStatus::Pending => Err(AppError::Forbidden(
                "Registo aguarda aprovação".to_string(),
            )),
            ApprovalStatus::Rejected => Err(AppError::Forbidden(
                "Registo foi rejeitado".to_string(),
            )),
        }
    }
}
