use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::db::{Counter, CounterStore};
use crate::error::{AppError, DatabaseError};
use crate::Result;

/// Business rules over a [`CounterStore`].
#[derive(Clone)]
pub struct CounterService {
    store: Arc<dyn CounterStore>,
}

impl CounterService {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn create_counter(&self, name: &str) -> Result<Counter> {
        if name.trim().is_empty() {
            return Err(AppError::ValidationError("name must not be empty".into()));
        }

        let counter = self.store.create_counter(name).await.map_err(not_found)?;
        info!(id = %counter.id, name = %counter.name, "Counter created");
        Ok(counter)
    }

    pub async fn increment_counter(&self, id: Uuid) -> Result<Counter> {
        let counter = self.store.increment_counter(id).await.map_err(not_found)?;
        info!(id = %counter.id, value = counter.value, "Counter incremented");
        Ok(counter)
    }

    /// Returns how many counters were deleted. Zero covers both an unknown id
    /// and one that was already deleted.
    pub async fn soft_delete_counter(&self, id: Uuid) -> Result<u64> {
        let affected = self.store.soft_delete_counter(id).await.map_err(not_found)?;
        info!(id = %id, affected, "Counter soft-deleted");
        Ok(affected)
    }
}

fn not_found(err: DatabaseError) -> AppError {
    match err {
        DatabaseError::NotFound => AppError::CounterNotFound,
        other => AppError::DatabaseError(other),
    }
}
