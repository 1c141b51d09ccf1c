//! Persistence for counters.
//!
//! `CounterStore` is the seam the service talks to; `DbOperations` is the
//! Postgres implementation.

pub mod models;
pub mod operations;

pub use models::Counter;
pub use operations::DbOperations;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Counter persistence. Each operation is a single statement, so concurrent
/// callers need no locking of their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Insert a counter named `name` with value 0 and return it.
    async fn create_counter(&self, name: &str) -> Result<Counter, DatabaseError>;

    /// Add one to a live counter's value.
    ///
    /// Returns `DatabaseError::NotFound` when no live counter has this id.
    async fn increment_counter(&self, id: Uuid) -> Result<Counter, DatabaseError>;

    /// Mark a live counter deleted.
    ///
    /// Returns the number of rows affected: 1 on the first call, 0 if the id
    /// is unknown or already deleted.
    async fn soft_delete_counter(&self, id: Uuid) -> Result<u64, DatabaseError>;
}
