//! Bus repository.

use std::sync::Arc;

use crate::entities::{Bus, bus};
use crate::map_unique_violation;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use unibus_common::{AppError, AppResult};

/// Bus repository for database operations.
#[derive(Clone)]
pub struct BusRepository {
    db: Arc<DatabaseConnection>,
}

impl BusRepository {
    /// Create a new bus repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a bus by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<bus::Model>> {
        Bus::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a bus by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<bus::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bus {id}")))
    }

    /// Lock a bus row for the rest of the transaction.
    ///
    /// Concurrent reservations for the same bus queue up behind this lock.
    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<bus::Model>> {
        Bus::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new bus.
    pub async fn create(&self, model: bus::ActiveModel) -> AppResult<bus::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "Número de autocarro já existe"))
    }

    /// Toggle whether a bus accepts reservations.
    pub async fn set_active(&self, id: &str, is_active: bool) -> AppResult<bus::Model> {
        let bus = self.get_by_id(id).await?;
        let mut active: bus::ActiveModel = bus.into();
        active.is_active = Set(is_active);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List buses ordered by fleet number.
    pub async fn find_all(&self, active_only: bool) -> AppResult<Vec<bus::Model>> {
        let mut query = Bus::find().order_by_asc(bus::Column::Number);

        if active_only {
            query = query.filter(bus::Column::IsActive.eq(true));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
