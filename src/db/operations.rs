use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::Counter;
use crate::db::CounterStore;
use crate::error::{AppError, DatabaseError};

const CREATE_COUNTER_SQL: &str = r#"
    INSERT INTO counter (id, name, value, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, value, created_at, updated_at, deleted_at
"#;

const INCREMENT_COUNTER_SQL: &str = r#"
    UPDATE counter
    SET value = value + 1
    WHERE id = $1 AND deleted_at IS NULL
    RETURNING id, name, value, created_at, updated_at, deleted_at
"#;

const SOFT_DELETE_COUNTER_SQL: &str = r#"
    UPDATE counter
    SET deleted_at = $2
    WHERE id = $1 AND deleted_at IS NULL
"#;

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Open a pool from the configured connection parameters.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "Connected to database"
        );
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CounterStore for DbOperations {
    async fn create_counter(&self, name: &str) -> Result<Counter, DatabaseError> {
        let counter = Counter::new(name);

        let created = sqlx::query_as::<_, Counter>(CREATE_COUNTER_SQL)
            .bind(counter.id)
            .bind(&counter.name)
            .bind(counter.value)
            .bind(counter.created_at)
            .bind(counter.updated_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(created)
    }

    async fn increment_counter(&self, id: Uuid) -> Result<Counter, DatabaseError> {
        // fetch_one maps "no row" to RowNotFound, which converts to NotFound.
        let counter = sqlx::query_as::<_, Counter>(INCREMENT_COUNTER_SQL)
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(counter)
    }

    async fn soft_delete_counter(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(SOFT_DELETE_COUNTER_SQL)
            .bind(id)
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
