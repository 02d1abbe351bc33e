//! SQL executor
//!
//! Runs rendered DDL statements one at a time, in order.

use crate::db::connection::DatabaseConnection;
use crate::error::Result;

/// SQL executor for running statements
pub struct SqlExecutor {
    connection: DatabaseConnection,
}

impl SqlExecutor {
    /// Create a new SQL executor
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Execute a single SQL statement
    pub async fn execute(&self, sql: &str) -> Result<()> {
        self.connection.execute(sql).await
    }

    /// Execute statements in order, stopping at the first failure.
    ///
    /// Statements that already ran are not undone.
    pub async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        for (i, statement) in statements.iter().enumerate() {
            tracing::info!(statement = i + 1, sql = %statement, "Executing DDL");

            if let Err(e) = self.execute(statement).await {
                tracing::error!(
                    statement = i + 1,
                    applied = i,
                    sql = %statement,
                    error = %e,
                    "DDL statement failed"
                );
                return Err(e);
            }
        }

        Ok(())
    }

    /// Get database connection
    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}
