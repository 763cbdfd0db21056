//! Ride repository.

use std::sync::Arc;

use crate::entities::{Ride, ride, ride::RideStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use unibus_common::{AppError, AppResult};

/// Ride repository for database operations.
#[derive(Clone)]
pub struct RideRepository {
    db: Arc<DatabaseConnection>,
}

impl RideRepository {
    /// Create a new ride repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a ride by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ride::Model>> {
        Ride::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a ride by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ride::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride {id}")))
    }

    /// Lock a ride row for the rest of the transaction.
    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<ride::Model>> {
        Ride::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new ride.
    pub async fn create(&self, model: ride::ActiveModel) -> AppResult<ride::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Available rides departing at or after `now`, earliest first.
    pub async fn find_available(
        &self,
        now: DateTimeWithTimeZone,
        limit: u64,
    ) -> AppResult<Vec<ride::Model>> {
        Ride::find()
            .filter(ride::Column::Status.eq(RideStatus::Available))
            .filter(ride::Column::StartTime.gte(now))
            .order_by_asc(ride::Column::StartTime)
            .order_by_asc(ride::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every ride offered by a driver, newest first.
    pub async fn find_by_driver(&self, driver_id: &str) -> AppResult<Vec<ride::Model>> {
        Ride::find()
            .filter(ride::Column::DriverId.eq(driver_id))
            .order_by_desc(ride::Column::CreatedAt)
            .order_by_desc(ride::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a ride to `to` if its current status is one of `from`.
    ///
    /// Returns the number of rows changed.
    pub async fn transition<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        from: &[RideStatus],
        to: RideStatus,
        at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        let result = Ride::update_many()
            .col_expr(ride::Column::Status, Expr::value(to))
            .col_expr(ride::Column::UpdatedAt, Expr::value(Some(at)))
            .filter(ride::Column::Id.eq(id))
            .filter(ride::Column::Status.is_in(from.iter().copied()))
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
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_ride(id: &str, driver_id: &str, hours_ahead: i64) -> ride::Model {
        ride::Model {
            id: id.to_string(),
            driver_id: driver_id.to_string(),
            from_location: "ISPTEC".to_string(),
            to_location: "Talatona".to_string(),
            start_time: (Utc::now() + Duration::hours(hours_ahead)).into(),
            end_time: None,
            available_seats: 3,
            price: 0,
            description: None,
            status: RideStatus::Available,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_available() {
        let r1 = create_test_ride("r1", "d1", 1);
        let r2 = create_test_ride("r2", "d2", 5);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = RideRepository::new(db);
        let rides = repo.find_available(Utc::now().into(), 50).await.unwrap();

        assert_eq!(rides.len(), 2);
        assert!(rides[0].start_time <= rides[1].start_time);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ride::Model>::new()])
                .into_connection(),
        );

        let repo = RideRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_transition() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = RideRepository::new(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ));
        let rows = repo
            .transition(
                &db,
                "r1",
                &[RideStatus::Available],
                RideStatus::Cancelled,
                Utc::now().into(),
            )
            .await
            .unwrap();

        assert_eq!(rows, 1);
    }
}
