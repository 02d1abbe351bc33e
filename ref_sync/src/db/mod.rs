//! Database module for RefSync
//!
//! This module handles database connections and statement execution.

pub mod connection;
pub mod executor;

// Re-export key types
pub use connection::{DatabaseConnection, DatabasePool};
pub use executor::SqlExecutor;
