//! Schema catalog
//!
//! Existence checks over a schema snapshot, and in-memory application of
//! planned operations with the same conflict rules a database enforces.

use crate::error::{Error, Result};
use crate::schema::types::{
    Action, Column, ColumnOp, ColumnType, DatabaseSchema, Index, IndexOp, SchemaOp, Table,
};

/// Read-only view of tables, columns and indexes
pub trait SchemaCatalog {
    /// Whether `table.column` exists with the given type.
    ///
    /// `default: None` accepts any default.
    fn column_exists(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        default: Option<&str>,
    ) -> bool;

    /// Whether an index over exactly `columns`, in order, exists.
    ///
    /// `name: None` accepts any name.
    fn index_exists(&self, table: &str, columns: &[&str], name: Option<&str>) -> bool;
}

impl SchemaCatalog for DatabaseSchema {
    fn column_exists(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        default: Option<&str>,
    ) -> bool {
        self.table(table)
            .and_then(|t| t.column(column))
            .map_or(false, |c| {
                c.column_type == column_type
                    && default.map_or(true, |d| c.default.as_deref() == Some(d))
            })
    }

    fn index_exists(&self, table: &str, columns: &[&str], name: Option<&str>) -> bool {
        self.table(table).map_or(false, |t| {
            t.indexes.iter().any(|index| {
                index.columns.iter().map(String::as_str).eq(columns.iter().copied())
                    && name.map_or(true, |n| index.name == n)
            })
        })
    }
}

impl DatabaseSchema {
    /// Apply one operation, failing with `SchemaConflict` if the schema
    /// does not allow it
    pub fn apply(&mut self, op: &SchemaOp) -> Result<()> {
        let table = self.tables.get_mut(op.table()).ok_or_else(|| {
            Error::SchemaConflict(format!("table '{}' does not exist", op.table()))
        })?;

        match op {
            SchemaOp::Column(op) => apply_column_op(table, op),
            SchemaOp::Index(op) => apply_index_op(table, op),
        }
    }

    /// Apply operations in order, stopping at the first failure.
    ///
    /// Operations applied before the failure remain applied.
    pub fn apply_all<'a, I>(&mut self, ops: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a SchemaOp>,
    {
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }
}

fn apply_column_op(table: &mut Table, op: &ColumnOp) -> Result<()> {
    match op.action {
        Action::Add => {
            if table.column(&op.column).is_some() {
                return Err(Error::SchemaConflict(format!(
                    "column '{}' already exists on table '{}'",
                    op.column, table.name
                )));
            }

            let mut column = Column::new(&op.column, op.column_type.clone()).nullable(op.nullable);
            column.default = op.default.clone();
            table.add_column(column);
            Ok(())
        }
        Action::Remove => {
            if table.column(&op.column).is_none() {
                if op.if_exists {
                    return Ok(());
                }
                return Err(Error::SchemaConflict(format!(
                    "column '{}' does not exist on table '{}'",
                    op.column, table.name
                )));
            }

            table.columns.retain(|c| c.name != op.column);
            table
                .indexes
                .retain(|index| !index.columns.iter().any(|c| c == &op.column));
            Ok(())
        }
    }
}

fn apply_index_op(table: &mut Table, op: &IndexOp) -> Result<()> {
    match op.action {
        Action::Add => {
            if let Some(missing) = op.columns.iter().find(|c| table.column(c).is_none()) {
                return Err(Error::SchemaConflict(format!(
                    "cannot index missing column '{}' on table '{}'",
                    missing, table.name
                )));
            }

            let name = op.name.clone().ok_or_else(|| {
                Error::MigrationError(format!(
                    "index on {}({}) has no name",
                    table.name,
                    op.columns.join(", ")
                ))
            })?;
            if table.index_named(&name).is_some() {
                return Err(Error::SchemaConflict(format!(
                    "index '{}' already exists on table '{}'",
                    name, table.name
                )));
            }

            table.add_index(Index {
                name,
                columns: op.columns.clone(),
                is_unique: false,
            });
            Ok(())
        }
        Action::Remove => {
            let position = table.indexes.iter().position(|index| match &op.name {
                Some(name) => &index.name == name,
                None => index.columns == op.columns,
            });

            match position {
                Some(position) => {
                    table.indexes.remove(position);
                    Ok(())
                }
                None => Err(Error::SchemaConflict(format!(
                    "no index {} on table '{}'",
                    op.name
                        .clone()
                        .unwrap_or_else(|| format!("over ({})", op.columns.join(", "))),
                    table.name
                ))),
            }
        }
    }
}
