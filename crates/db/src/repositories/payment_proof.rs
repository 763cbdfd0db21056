//! Payment proof repository.

use std::sync::Arc;

use crate::entities::{PaymentProof, payment_proof, student::ApprovalStatus};
use crate::repositories::ApprovalChange;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Payment proof repository for database operations.
#[derive(Clone)]
pub struct PaymentProofRepository {
    db: Arc<DatabaseConnection>,
}

impl PaymentProofRepository {
    /// Create a new payment proof repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a proof by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<payment_proof::Model>> {
        PaymentProof::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a proof by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<payment_proof::Model>> {
        PaymentProof::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach a proof to a booking, on the given connection.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: payment_proof::ActiveModel,
    ) -> AppResult<payment_proof::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Proofs awaiting verification, oldest first.
    pub async fn find_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<payment_proof::Model>> {
        PaymentProof::find()
            .filter(payment_proof::Column::Status.eq(ApprovalStatus::Pending))
            .order_by_asc(payment_proof::Column::CreatedAt)
            .order_by_asc(payment_proof::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an approval decision if the proof is still pending.
    pub async fn decide<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<u64> {
        let result = PaymentProof::update_many()
            .col_expr(payment_proof::Column::Status, Expr::value(change.status))
            .col_expr(
                payment_proof::Column::ApprovedBy,
                Expr::value(Some(change.decided_by.clone())),
            )
            .col_expr(
                payment_proof::Column::ApprovedAt,
                Expr::value(Some(change.decided_at)),
            )
            .col_expr(
                payment_proof::Column::RejectionReason,
                Expr::value(change.reason.clone()),
            )
            .filter(payment_proof::Column::Id.eq(id))
            .filter(payment_proof::Column::Status.eq(ApprovalStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
