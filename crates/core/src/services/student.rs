//! Student registration and lookup.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use unibus_common::{AppError, AppResult};
use unibus_db::{
    entities::{student, student::ApprovalStatus},
    repositories::StudentRepository,
};
use validator::Validate;

use crate::context::CallerContext;

/// Input for registering the caller as a student.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStudentInput {
    #[validate(length(min = 1, max = 256))]
    pub full_name: String,

    #[validate(length(min = 1, max = 64))]
    pub student_number: String,

    #[validate(length(min = 1, max = 256))]
    pub university: String,
}

/// Student service for business logic.
#[derive(Clone)]
pub struct StudentService {
    student_repo: StudentRepository,
}

impl StudentService {
    /// Create a new student service.
    #[must_use]
    pub const fn new(student_repo: StudentRepository) -> Self {
        Self { student_repo }
    }

    /// Register the caller. The profile starts out pending approval.
    pub async fn register(
        &self,
        caller: &CallerContext,
        input: RegisterStudentInput,
    ) -> AppResult<student::Model> {
        input.validate()?;

        let student_number = input.student_number.trim().to_string();

        if self.student_repo.find_by_id(&caller.identity).await?.is_some() {
            return Err(AppError::Conflict("Estudante já registado".to_string()));
        }

        if self
            .student_repo
            .find_by_student_number(&student_number)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Número de estudante já registado".to_string(),
            ));
        }

        let model = student::ActiveModel {
            id: Set(caller.identity.clone()),
            account_id: Set(caller.identity.clone()),
            full_name: Set(input.full_name.trim().to_string()),
            student_number: Set(student_number),
            university: Set(input.university.trim().to_string()),
            approval_status: Set(ApprovalStatus::Pending),
            approved_by: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            vehicle_make: Set(None),
            vehicle_model: Set(None),
            vehicle_color: Set(None),
            vehicle_plate: Set(None),
            qr_code: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let student = self.student_repo.create(model).await?;

        tracing::info!(student_id = %student.id, "Student registered, awaiting approval");

        Ok(student)
    }

    /// The caller's own profile.
    pub async fn get_me(&self, caller: &CallerContext) -> AppResult<student::Model> {
        self.student_repo.get_by_id(&caller.identity).await
    }

    /// Find a student by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<student::Model>> {
        self.student_repo.find_by_id(id).await
    }

    /// Resolve a scanned QR payload to its student (boarding check).
    pub async fn find_by_qr(
        &self,
        caller: &CallerContext,
        qr_code: &str,
    ) -> AppResult<student::Model> {
        caller.require_admin()?;

        self.student_repo
            .find_by_qr_code(qr_code.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("QR code not recognised".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_student(id: &str, number: &str) -> student::Model {
        student::Model {
            id: id.to_string(),
            account_id: id.to_string(),
            full_name: "Ana Silva".to_string(),
            student_number: number.to_string(),
            university: "ISPTEC".to_string(),
            approval_status: ApprovalStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            vehicle_make: None,
            vehicle_model: None,
            vehicle_color: None,
            vehicle_plate: None,
            qr_code: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn input(number: &str) -> RegisterStudentInput {
        RegisterStudentInput {
            full_name: "Ana Silva".to_string(),
            student_number: number.to_string(),
            university: "ISPTEC".to_string(),
        }
    }

    fn service_with(db: MockDatabase) -> StudentService {
        StudentService::new(StudentRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_register_input_validation() {
        let mut bad = input("20240001");
        bad.full_name = String::new();
        assert!(bad.validate().is_err());

        assert!(input("20240001").validate().is_ok());
    }

    #[tokio::test]
    async fn test_register_starts_pending() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<student::Model>::new()])
            .append_query_results([Vec::<student::Model>::new()])
            .append_query_results([[create_test_student("s1", "20240001")]]);

        let service = service_with(db);
        let student = service
            .register(&CallerContext::student("s1"), input("20240001"))
            .await
            .unwrap();

        assert_eq!(student.approval_status, ApprovalStatus::Pending);
        assert!(student.qr_code.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_student_number_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<student::Model>::new()])
            .append_query_results([[create_test_student("s9", "20240001")]]);

        let service = service_with(db);
        let result = service
            .register(&CallerContext::student("s1"), input("20240001"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_twice_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_student("s1", "20240001")]]);

        let service = service_with(db);
        let result = service
            .register(&CallerContext::student("s1"), input("20240002"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_by_qr_requires_admin() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .find_by_qr(&CallerContext::student("s1"), "UNB-ABC")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_find_by_unknown_qr_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<student::Model>::new()]);

        let service = service_with(db);
        let result = service
            .find_by_qr(&CallerContext::admin("admin1"), "UNB-NOPE")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
