//! Driver application repository.

use std::sync::Arc;

use crate::entities::{DriverApplication, driver_application, student::ApprovalStatus};
use crate::map_unique_violation;
use crate::repositories::ApprovalChange;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Driver application repository for database operations.
#[derive(Clone)]
pub struct DriverApplicationRepository {
    db: Arc<DatabaseConnection>,
}

impl DriverApplicationRepository {
    /// Create a new driver application repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an application by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<driver_application::Model>> {
        DriverApplication::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an application by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<driver_application::Model>> {
        DriverApplication::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The student's undecided application, if any.
    pub async fn find_pending_by_student(
        &self,
        student_id: &str,
    ) -> AppResult<Option<driver_application::Model>> {
        DriverApplication::find()
            .filter(driver_application::Column::StudentId.eq(student_id))
            .filter(driver_application::Column::Status.eq(ApprovalStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Submit a new application.
    pub async fn create(
        &self,
        model: driver_application::ActiveModel,
    ) -> AppResult<driver_application::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "Já tem um pedido de motorista pendente"))
    }

    /// Applications awaiting a decision, oldest first.
    pub async fn find_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<driver_application::Model>> {
        DriverApplication::find()
            .filter(driver_application::Column::Status.eq(ApprovalStatus::Pending))
            .order_by_asc(driver_application::Column::CreatedAt)
            .order_by_asc(driver_application::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an approval decision if the application is still pending.
    pub async fn decide<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<u64> {
        let result = DriverApplication::update_many()
            .col_expr(driver_application::Column::Status, Expr::value(change.status))
            .col_expr(
                driver_application::Column::ApprovedBy,
                Expr::value(Some(change.decided_by.clone())),
            )
            .col_expr(
                driver_application::Column::ApprovedAt,
                Expr::value(Some(change.decided_at)),
            )
            .col_expr(
                driver_application::Column::RejectionReason,
                Expr::value(change.reason.clone()),
            )
            .filter(driver_application::Column::Id.eq(id))
            .filter(driver_application::Column::Status.eq(ApprovalStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
