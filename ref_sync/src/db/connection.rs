//! Database connection handling
//!
//! This module provides functionality to establish and manage database connections.

use sqlx::{
    mysql::MySqlPoolOptions, postgres::PgPoolOptions, sqlite::SqlitePoolOptions, MySql, Pool,
    Postgres, Sqlite,
};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::schema::generator::Dialect;

/// Pool for one of the supported database types
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

/// A pooled connection plus the schema it operates in
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: DatabasePool,
    schema: Option<String>,
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(10);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(30));

        let pool = match Dialect::from_driver(&config.driver)? {
            Dialect::Postgres => DatabasePool::Postgres(
                PgPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
            Dialect::MySql => DatabasePool::MySql(
                MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
            Dialect::Sqlite => DatabasePool::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
        };

        tracing::debug!(driver = %config.driver, pool_size, "Connected to database");

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        match self.pool {
            DatabasePool::Postgres(_) => Dialect::Postgres,
            DatabasePool::MySql(_) => Dialect::MySql,
            DatabasePool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Get the configured schema name
    pub fn get_schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Execute a SQL statement
    pub async fn execute(&self, sql: &str) -> Result<()> {
        match &self.pool {
            DatabasePool::Postgres(pool) => {
                sqlx::query(sql).execute(pool).await?;
            }
            DatabasePool::MySql(pool) => {
                sqlx::query(sql).execute(pool).await?;
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query(sql).execute(pool).await?;
            }
        }
        Ok(())
    }
}
