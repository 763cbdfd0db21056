//! Bus reservation repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{BusReservation, bus_reservation, bus_reservation::ReservationStatus};
use crate::map_unique_violation;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QuerySelect, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Active reservation count for one bus.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct BusOccupancy {
    /// Bus the count refers to.
    pub bus_id: String,
    /// Number of active reservations.
    pub occupied: i64,
}

/// Bus reservation repository for database operations.
#[derive(Clone)]
pub struct BusReservationRepository {
    db: Arc<DatabaseConnection>,
}

impl BusReservationRepository {
    /// Create a new bus reservation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reservation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<bus_reservation::Model>> {
        BusReservation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The student's active reservation, if any.
    pub async fn find_active_by_student(
        &self,
        student_id: &str,
    ) -> AppResult<Option<bus_reservation::Model>> {
        self.find_active_by_student_in(self.db.as_ref(), student_id)
            .await
    }

    /// Same as [`Self::find_active_by_student`], on the given connection.
    pub async fn find_active_by_student_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        student_id: &str,
    ) -> AppResult<Option<bus_reservation::Model>> {
        BusReservation::find()
            .filter(bus_reservation::Column::StudentId.eq(student_id))
            .filter(bus_reservation::Column::Status.eq(ReservationStatus::Active))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active reservations on a bus.
    pub async fn count_active_by_bus<C: ConnectionTrait>(
        &self,
        conn: &C,
        bus_id: &str,
    ) -> AppResult<u64> {
        BusReservation::find()
            .filter(bus_reservation::Column::BusId.eq(bus_id))
            .filter(bus_reservation::Column::Status.eq(ReservationStatus::Active))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reservation.
    ///
    /// A second active reservation for the same student trips the partial unique
    /// index and is reported as a conflict.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: bus_reservation::ActiveModel,
    ) -> AppResult<bus_reservation::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| map_unique_violation(e, "Você já tem uma reserva ativa"))
    }

    /// Cancel the student's active reservation. Returns rows changed (0 or 1).
    pub async fn cancel_active(
        &self,
        student_id: &str,
        cancelled_by: &str,
        cancelled_at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        let result = BusReservation::update_many()
            .col_expr(
                bus_reservation::Column::Status,
                Expr::value(ReservationStatus::Cancelled),
            )
            .col_expr(
                bus_reservation::Column::CancelledAt,
                Expr::value(Some(cancelled_at)),
            )
            .col_expr(
                bus_reservation::Column::CancelledBy,
                Expr::value(Some(cancelled_by.to_string())),
            )
            .filter(bus_reservation::Column::StudentId.eq(student_id))
            .filter(bus_reservation::Column::Status.eq(ReservationStatus::Active))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Active reservations per bus. Buses with none are absent from the map.
    pub async fn occupancy_counts(&self) -> AppResult<HashMap<String, u64>> {
        let rows = BusReservation::find()
            .select_only()
            .column(bus_reservation::Column::BusId)
            .column_as(bus_reservation::Column::Id.count(), "occupied")
            .filter(bus_reservation::Column::Status.eq(ReservationStatus::Active))
            .group_by(bus_reservation::Column::BusId)
            .into_model::<BusOccupancy>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.bus_id, u64::try_from(row.occupied).unwrap_or(0)))
            .collect())
    }
}
