//! DDL generator
//!
//! This module renders reference plans as dialect-specific SQL statements

use std::fmt;

use crate::error::{Error, Result};
use crate::schema::types::{
    Action, ColumnOp, ColumnType, DatabaseSchema, IndexOp, ReferencePlan, SchemaOp, Table,
};
use crate::utils::naming::{format_sql_identifier, quote_string_literal};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Resolve a dialect from a configured driver name
    pub fn from_driver(driver: &str) -> Result<Self> {
        match driver.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(Error::ConfigError(format!(
                "Unsupported database driver: {}",
                driver
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Whether dropping a column also drops the indexes that cover it
    fn drops_dependent_indexes(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renders plans as SQL for one dialect
#[derive(Debug, Clone, Copy)]
pub struct DdlGenerator {
    dialect: Dialect,
}

impl DdlGenerator {
    /// Create a new DDL generator
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render a plan against a snapshot of the current schema.
    ///
    /// Each operation is applied to a working copy of the snapshot after it
    /// is rendered, so conflicts are reported before any SQL is returned and
    /// later operations see the effect of earlier ones.
    pub fn generate(&self, plan: &ReferencePlan, snapshot: &DatabaseSchema) -> Result<Vec<String>> {
        let mut working = snapshot.clone();
        let mut statements = Vec::new();
        let schema = snapshot.schema_name.as_deref();

        for op in &plan.ops {
            let table = working.table(op.table()).ok_or_else(|| {
                Error::SchemaConflict(format!("table '{}' does not exist", op.table()))
            })?;

            let sql = match op {
                SchemaOp::Column(op) => self.column_sql(schema, table, op)?,
                SchemaOp::Index(op) => self.index_sql(schema, table, op)?,
            };
            working.apply(op)?;

            tracing::trace!(dialect = %self.dialect, count = sql.len(), "Rendered operation");
            statements.extend(sql);
        }

        Ok(statements)
    }

    fn column_sql(&self, schema: Option<&str>, table: &Table, op: &ColumnOp) -> Result<Vec<String>> {
        let table_name = self.qualify(schema, &op.table);
        let column_name = self.quote(&op.column);

        match op.action {
            Action::Add => {
                if self.dialect == Dialect::Sqlite && !op.nullable && op.default.is_none() {
                    return Err(Error::MigrationError(format!(
                        "SQLite cannot add NOT NULL column '{}' without default value",
                        op.column
                    )));
                }

                let mut definition = format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    table_name,
                    column_name,
                    self.type_sql(&op.column_type)
                );
                if let Some(default) = &op.default {
                    definition.push_str(&format!(" DEFAULT {}", quote_string_literal(default)));
                }
                if !op.nullable {
                    definition.push_str(" NOT NULL");
                }

                Ok(vec![format!("{};", definition)])
            }
            Action::Remove => {
                if op.if_exists && table.column(&op.column).is_none() {
                    return Ok(Vec::new());
                }

                let mut sql = Vec::new();
                if !self.dialect.drops_dependent_indexes() {
                    for index in table.indexes_covering(&op.column) {
                        sql.push(self.drop_index_sql(schema, &op.table, &index.name));
                    }
                }
                sql.push(format!(
                    "ALTER TABLE {} DROP COLUMN {};",
                    table_name, column_name
                ));

                Ok(sql)
            }
        }
    }

    fn index_sql(&self, schema: Option<&str>, table: &Table, op: &IndexOp) -> Result<Vec<String>> {
        match op.action {
            Action::Add => {
                let name = op.name.as_deref().ok_or_else(|| {
                    Error::MigrationError(format!(
                        "index on {}({}) has no name",
                        op.table,
                        op.columns.join(", ")
                    ))
                })?;
                let columns: Vec<String> = op.columns.iter().map(|c| self.quote(c)).collect();

                Ok(vec![format!(
                    "CREATE INDEX {} ON {} ({});",
                    self.quote(name),
                    self.qualify(schema, &op.table),
                    columns.join(", ")
                )])
            }
            Action::Remove => {
                let name = match &op.name {
                    Some(name) => name.clone(),
                    None => table
                        .indexes
                        .iter()
                        .find(|index| index.columns == op.columns)
                        .map(|index| index.name.clone())
                        .ok_or_else(|| {
                            Error::SchemaConflict(format!(
                                "no index over ({}) on table '{}'",
                                op.columns.join(", "),
                                op.table
                            ))
                        })?,
                };

                Ok(vec![self.drop_index_sql(schema, &op.table, &name)])
            }
        }
    }

    fn drop_index_sql(&self, schema: Option<&str>, table: &str, index: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "DROP INDEX {} ON {};",
                self.quote(index),
                self.qualify(schema, table)
            ),
            Dialect::Postgres | Dialect::Sqlite => {
                format!("DROP INDEX {};", self.qualify(schema, index))
            }
        }
    }

    fn type_sql(&self, column_type: &ColumnType) -> String {
        match (self.dialect, column_type) {
            (Dialect::MySql, ColumnType::Integer) => "INT".to_string(),
            (_, ColumnType::Integer) => "INTEGER".to_string(),
            (_, ColumnType::String) => "VARCHAR(255)".to_string(),
            (_, ColumnType::Other(name)) => name.to_uppercase(),
        }
    }

    fn quote(&self, identifier: &str) -> String {
        format_sql_identifier(identifier, self.dialect.name())
    }

    /// Prefix a table or index name with the snapshot's schema.
    ///
    /// SQLite snapshots always describe the main database, so names stay bare.
    fn qualify(&self, schema: Option<&str>, identifier: &str) -> String {
        match (self.dialect, schema) {
            (Dialect::Postgres | Dialect::MySql, Some(schema)) => {
                format!("{}.{}", self.quote(schema), self.quote(identifier))
            }
            _ => self.quote(identifier),
        }
    }
}
