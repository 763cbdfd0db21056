//! Schedule repository.

use std::sync::Arc;

use crate::entities::{Schedule, schedule};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use unibus_common::{AppError, AppResult};

/// Schedule repository for database operations.
#[derive(Clone)]
pub struct ScheduleRepository {
    db: Arc<DatabaseConnection>,
}

impl ScheduleRepository {
    /// Create a new schedule repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a schedule by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<schedule::Model>> {
        Schedule::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new schedule entry.
    pub async fn create(&self, model: schedule::ActiveModel) -> AppResult<schedule::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Timetable for a route, by weekday then departure time.
    pub async fn find_by_route(&self, route_id: &str) -> AppResult<Vec<schedule::Model>> {
        Schedule::find()
            .filter(schedule::Column::RouteId.eq(route_id))
            .order_by_asc(schedule::Column::DayOfWeek)
            .order_by_asc(schedule::Column::DepartureTime)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
