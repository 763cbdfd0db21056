//! Event booking repository.

use std::sync::Arc;

use crate::entities::{EventBooking, event_booking, event_booking::PaymentStatus};
use crate::map_unique_violation;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Event booking repository for database operations.
#[derive(Clone)]
pub struct EventBookingRepository {
    db: Arc<DatabaseConnection>,
}

impl EventBookingRepository {
    /// Create a new event booking repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a booking by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event_booking::Model>> {
        EventBooking::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a booking by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event_booking::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event booking {id}")))
    }

    /// The student's booking for an event, if any.
    pub async fn find_by_pair(
        &self,
        event_id: &str,
        student_id: &str,
    ) -> AppResult<Option<event_booking::Model>> {
        EventBooking::find()
            .filter(event_booking::Column::EventId.eq(event_id))
            .filter(event_booking::Column::StudentId.eq(student_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bookings made by a student, newest first.
    pub async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<event_booking::Model>> {
        EventBooking::find()
            .filter(event_booking::Column::StudentId.eq(student_id))
            .order_by_desc(event_booking::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new booking.
    pub async fn create(
        &self,
        model: event_booking::ActiveModel,
    ) -> AppResult<event_booking::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "Já tem uma reserva para este evento"))
    }

    /// Set a booking's payment status.
    pub async fn set_payment_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        status: PaymentStatus,
    ) -> AppResult<u64> {
        let result = EventBooking::update_many()
            .col_expr(event_booking::Column::PaymentStatus, Expr::value(status))
            .filter(event_booking::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
