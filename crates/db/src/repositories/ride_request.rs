//! Ride request repository.

use std::sync::Arc;

use crate::entities::{RideRequest, ride_request, ride_request::RideRequestStatus};
use crate::map_unique_violation;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Ride request repository for database operations.
#[derive(Clone)]
pub struct RideRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl RideRequestRepository {
    /// Create a new ride request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a ride request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ride_request::Model>> {
        RideRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a ride request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ride_request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride request {id}")))
    }

    /// Find a ride request by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<ride_request::Model>> {
        RideRequest::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The passenger's outstanding request on a ride, if any.
    pub async fn find_pending_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        ride_id: &str,
        passenger_id: &str,
    ) -> AppResult<Option<ride_request::Model>> {
        RideRequest::find()
            .filter(ride_request::Column::RideId.eq(ride_id))
            .filter(ride_request::Column::PassengerId.eq(passenger_id))
            .filter(ride_request::Column::Status.eq(RideRequestStatus::Pending))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new ride request.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ride_request::ActiveModel,
    ) -> AppResult<ride_request::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| map_unique_violation(e, "Já existe um pedido pendente para esta boleia"))
    }

    /// Requests on a ride, newest first.
    pub async fn find_by_ride(&self, ride_id: &str) -> AppResult<Vec<ride_request::Model>> {
        RideRequest::find()
            .filter(ride_request::Column::RideId.eq(ride_id))
            .order_by_desc(ride_request::Column::CreatedAt)
            .order_by_desc(ride_request::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accepted requests on a ride.
    pub async fn count_accepted<C: ConnectionTrait>(&self, conn: &C, ride_id: &str) -> AppResult<u64> {
        RideRequest::find()
            .filter(ride_request::Column::RideId.eq(ride_id))
            .filter(ride_request::Column::Status.eq(RideRequestStatus::Accepted))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Decide a request if it is still pending. Returns rows changed.
    pub async fn decide<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        status: RideRequestStatus,
        decided_at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        let result = RideRequest::update_many()
            .col_expr(ride_request::Column::Status, Expr::value(status))
            .col_expr(ride_request::Column::DecidedAt, Expr::value(Some(decided_at)))
            .filter(ride_request::Column::Id.eq(id))
            .filter(ride_request::Column::Status.eq(RideRequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Reject every pending request on a ride. Returns rows changed.
    pub async fn reject_pending_for_ride<C: ConnectionTrait>(
        &self,
        conn: &C,
        ride_id: &str,
        decided_at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        let result = RideRequest::update_many()
            .col_expr(
                ride_request::Column::Status,
                Expr::value(RideRequestStatus::Rejected),
            )
            .col_expr(ride_request::Column::DecidedAt, Expr::value(Some(decided_at)))
            .filter(ride_request::Column::RideId.eq(ride_id))
            .filter(ride_request::Column::Status.eq(RideRequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_request(id: &str, ride_id: &str, passenger_id: &str) -> ride_request::Model {
        ride_request::Model {
            id: id.to_string(),
            ride_id: ride_id.to_string(),
            passenger_id: passenger_id.to_string(),
            status: RideRequestStatus::Pending,
            message: Some("oi".to_string()),
            created_at: Utc::now().into(),
            decided_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_pending_by_pair() {
        let request = create_test_request("q1", "r1", "p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[request]])
                .into_connection(),
        );

        let repo = RideRequestRepository::new(db.clone());
        let result = repo
            .find_pending_by_pair(db.as_ref(), "r1", "p1")
            .await
            .unwrap();

        assert_eq!(result.unwrap().id, "q1");
    }

    #[tokio::test]
    async fn test_find_by_ride() {
        let q1 = create_test_request("q2", "r1", "p2");
        let q2 = create_test_request("q1", "r1", "p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[q1, q2]])
                .into_connection(),
        );

        let repo = RideRequestRepository::new(db);
        let result = repo.find_by_ride("r1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "q2");
    }
}
