//! Student repository.

use std::sync::Arc;

use crate::entities::{Student, student, student::ApprovalStatus};
use crate::map_unique_violation;
use crate::repositories::ApprovalChange;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Student repository for database operations.
#[derive(Clone)]
pub struct StudentRepository {
    db: Arc<DatabaseConnection>,
}

impl StudentRepository {
    /// Create a new student repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a student by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<student::Model>> {
        Student::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a student by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<student::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {id}")))
    }

    /// Find a student by university student number.
    pub async fn find_by_student_number(
        &self,
        student_number: &str,
    ) -> AppResult<Option<student::Model>> {
        Student::find()
            .filter(student::Column::StudentNumber.eq(student_number))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a student by their issued QR identifier.
    pub async fn find_by_qr_code(&self, qr_code: &str) -> AppResult<Option<student::Model>> {
        Student::find()
            .filter(student::Column::QrCode.eq(qr_code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Lock a student row for the rest of the transaction (`SELECT ... FOR UPDATE`).
    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<student::Model>> {
        Student::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Register a new student.
    pub async fn create(&self, model: student::ActiveModel) -> AppResult<student::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            map_unique_violation(e, "Número de estudante ou conta já registado")
        })
    }

    /// Students awaiting a decision, oldest first.
    pub async fn find_pending(&self, limit: u64, offset: u64) -> AppResult<Vec<student::Model>> {
        Student::find()
            .filter(student::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .order_by_asc(student::Column::CreatedAt)
            .order_by_asc(student::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an approval decision if the student is still pending.
    ///
    /// Returns the number of rows changed; zero means another decision won.
    pub async fn decide<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<u64> {
        let result = Student::update_many()
            .col_expr(student::Column::ApprovalStatus, Expr::value(change.status))
            .col_expr(
                student::Column::ApprovedBy,
                Expr::value(Some(change.decided_by.clone())),
            )
            .col_expr(student::Column::ApprovedAt, Expr::value(Some(change.decided_at)))
            .col_expr(
                student::Column::RejectionReason,
                Expr::value(change.reason.clone()),
            )
            .col_expr(student::Column::UpdatedAt, Expr::value(Some(change.decided_at)))
            .filter(student::Column::Id.eq(id))
            .filter(student::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Issue a QR identifier unless the student already has one.
    pub async fn assign_qr_code<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        qr_code: &str,
    ) -> AppResult<u64> {
        let result = Student::update_many()
            .col_expr(student::Column::QrCode, Expr::value(Some(qr_code.to_string())))
            .filter(student::Column::Id.eq(id))
            .filter(student::Column::QrCode.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Record the vehicle a student drives, elevating them to driver.
    pub async fn set_vehicle<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        vehicle: &VehicleDescriptor,
    ) -> AppResult<u64> {
        let result = Student::update_many()
            .col_expr(student::Column::VehicleMake, Expr::value(Some(vehicle.make.clone())))
            .col_expr(student::Column::VehicleModel, Expr::value(Some(vehicle.model.clone())))
            .col_expr(student::Column::VehicleColor, Expr::value(Some(vehicle.color.clone())))
            .col_expr(student::Column::VehiclePlate, Expr::value(Some(vehicle.plate.clone())))
            .filter(student::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

/// Vehicle make, model, color and plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleDescriptor {
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Body color.
    pub color: String,
    /// Registration plate.
    pub plate: String,
}
