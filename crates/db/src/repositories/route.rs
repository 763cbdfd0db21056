//! Route repository.

use std::sync::Arc;

use crate::entities::{Route, route};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};
use unibus_common::{AppError, AppResult};

/// Route repository for database operations.
#[derive(Clone)]
pub struct RouteRepository {
    db: Arc<DatabaseConnection>,
}

impl RouteRepository {
    /// Create a new route repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a route by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<route::Model>> {
        Route::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a route by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<route::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Route {id}")))
    }

    /// Create a new route.
    pub async fn create(&self, model: route::ActiveModel) -> AppResult<route::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All routes ordered by name.
    pub async fn find_all(&self) -> AppResult<Vec<route::Model>> {
        Route::find()
            .order_by_asc(route::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
