//! Driver elevation requests.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use unibus_common::{AppError, AppResult, IdGenerator};
use unibus_db::{
    entities::{driver_application, student::ApprovalStatus},
    repositories::{DriverApplicationRepository, StudentRepository},
};
use validator::Validate;

use crate::context::CallerContext;

/// Vehicle the caller wants to drive.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DriverApplicationInput {
    #[validate(length(min = 1, max = 128))]
    pub vehicle_make: String,
    #[validate(length(min = 1, max = 128))]
    pub vehicle_model: String,
    #[validate(length(min = 1, max = 64))]
    pub vehicle_color: String,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_plate: String,
}

/// Driver service for business logic.
#[derive(Clone)]
pub struct DriverService {
    application_repo: DriverApplicationRepository,
    student_repo: StudentRepository,
    id_gen: IdGenerator,
}

impl DriverService {
    /// Create a new driver service.
    #[must_use]
    pub const fn new(
        application_repo: DriverApplicationRepository,
        student_repo: StudentRepository,
    ) -> Self {
        Self {
            application_repo,
            student_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a driver application for the caller.
    pub async fn apply(
        &self,
        caller: &CallerContext,
        input: DriverApplicationInput,
    ) -> AppResult<driver_application::Model> {
        input.validate()?;

        let student = self.student_repo.get_by_id(&caller.identity).await?;
        if student.is_driver() {
            return Err(AppError::Conflict("Já é motorista".to_string()));
        }

        if self
            .application_repo
            .find_pending_by_student(&student.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Já tem um pedido de motorista pendente".to_string(),
            ));
        }

        let model = driver_application::ActiveModel {
            id: Set(self.id_gen.generate()),
            student_id: Set(student.id.clone()),
            vehicle_make: Set(input.vehicle_make.trim().to_string()),
            vehicle_model: Set(input.vehicle_model.trim().to_string()),
            vehicle_color: Set(input.vehicle_color.trim().to_string()),
            vehicle_plate: Set(input.vehicle_plate.trim().to_uppercase()),
            status: Set(ApprovalStatus::Pending),
            approved_by: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let application = self.application_repo.create(model).await?;

        tracing::info!(
            application_id = %application.id,
            student_id = %student.id,
            "Driver application submitted"
        );

        Ok(application)
    }
}
