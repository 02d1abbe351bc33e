//! RefSync: reference column and index migrations
//!
//! RefSync turns `add_reference` / `remove_reference` intents (and their
//! `belongs_to` aliases) into ordered column and index operations, checks
//! them against the live table and applies them as DDL.
//!
//! The planner is usable on its own and never touches a database:
//!
//! ```
//! use ref_sync::{ReferenceOptions, ReferencePlanner};
//!
//! let plan = ReferencePlanner::default()
//!     .add_reference("taggings", "taggable", ReferenceOptions::new().polymorphic().index())
//!     .unwrap();
//! assert_eq!(plan.ops.len(), 3);
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use db::connection::DatabaseConnection;
pub use db::executor::SqlExecutor;
pub use error::{Error, Result};
pub use schema::analyzer::SchemaAnalyzer;
pub use schema::catalog::SchemaCatalog;
pub use schema::generator::{DdlGenerator, Dialect};
pub use schema::planner::ReferencePlanner;
pub use schema::reference::{IndexSpec, Polymorphic, ReferenceOptions, ReferenceSpec};
pub use schema::types::{ColumnOp, ColumnType, DatabaseSchema, IndexOp, ReferencePlan, SchemaOp};

/// Initialize RefSync with the specified configuration file
pub async fn init(config_path: &str) -> Result<RefSyncClient> {
    let config = config::load_from_file(config_path)?;
    utils::logging::init_logging(&config.logging)?;
    RefSyncClient::new(config).await
}

/// The main client for applying reference migrations to a database
pub struct RefSyncClient {
    config: Config,
    executor: SqlExecutor,
    schema_analyzer: SchemaAnalyzer,
}

impl RefSyncClient {
    /// Create a new RefSync client from configuration
    pub async fn new(config: Config) -> Result<Self> {
        let db_connection = DatabaseConnection::connect(&config.database).await?;
        let schema_analyzer = SchemaAnalyzer::new(db_connection.clone());
        let executor = SqlExecutor::new(db_connection);

        Ok(Self {
            config,
            executor,
            schema_analyzer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.executor.get_connection().dialect()
    }

    /// Read the current definition of a table
    pub async fn snapshot(&self, table: &str) -> Result<DatabaseSchema> {
        self.schema_analyzer.snapshot(table).await
    }

    /// Add a reference; returns the statements that were run (or would be, in dry run)
    pub async fn add_reference(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<Vec<String>> {
        ReferenceSpec::new(table, name, options.clone())?;
        let snapshot = self.snapshot(table).await?;
        let plan = self.planner_for(&snapshot, table).add_reference(table, name, options)?;

        self.apply_plan_to(&plan, &snapshot).await
    }

    /// Remove a reference; returns the statements that were run (or would be, in dry run)
    pub async fn remove_reference(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<Vec<String>> {
        ReferenceSpec::new(table, name, options.clone())?;
        let snapshot = self.snapshot(table).await?;
        let plan = self.planner_for(&snapshot, table).remove_reference(table, name, options)?;

        self.apply_plan_to(&plan, &snapshot).await
    }

    /// Alias of [`RefSyncClient::add_reference`]
    pub async fn add_belongs_to(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<Vec<String>> {
        self.add_reference(table, name, options).await
    }

    /// Alias of [`RefSyncClient::remove_reference`]
    pub async fn remove_belongs_to(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<Vec<String>> {
        self.remove_reference(table, name, options).await
    }

    /// Apply a plan built elsewhere, for example an inverted one
    pub async fn apply_plan(&self, plan: &ReferencePlan) -> Result<Vec<String>> {
        let snapshot = self.snapshot(&plan.table).await?;
        self.apply_plan_to(plan, &snapshot).await
    }

    fn planner_for(&self, snapshot: &DatabaseSchema, table: &str) -> ReferencePlanner {
        let known_indexes = snapshot
            .table(table)
            .map(|t| t.indexes.iter().map(|i| i.name.clone()).collect::<Vec<_>>())
            .unwrap_or_default();

        ReferencePlanner::new(&self.config.naming, self.dialect().name())
            .with_known_indexes(known_indexes)
    }

    async fn apply_plan_to(
        &self,
        plan: &ReferencePlan,
        snapshot: &DatabaseSchema,
    ) -> Result<Vec<String>> {
        let statements = DdlGenerator::new(self.dialect()).generate(plan, snapshot)?;

        if self.config.migrations.dry_run {
            let plan_json = serde_json::to_string(plan)?;
            tracing::info!(
                table = %plan.table,
                reference = %plan.reference,
                plan = %plan_json,
                "Reference plan (dry run)"
            );
            for (i, sql) in statements.iter().enumerate() {
                tracing::info!(statement = i + 1, sql = %sql, "Migration SQL (dry run)");
            }
            return Ok(statements);
        }

        self.executor.execute_batch(&statements).await?;

        tracing::info!(
            table = %plan.table,
            reference = %plan.reference,
            statements = statements.len(),
            "Reference migration applied"
        );
        Ok(statements)
    }
}
