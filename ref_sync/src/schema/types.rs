//! Type definitions for planned operations and schema snapshots

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical type of a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    String,
    /// Any introspected type the planner never produces
    Other(String),
}

impl ColumnType {
    /// Map a SQL type name reported by a database to a logical type
    pub fn from_sql_type(sql_type: &str) -> Self {
        let normalized = sql_type.trim().to_lowercase();
        let base = normalized
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_end_matches(" unsigned");

        match base {
            "integer" | "int" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "mediumint"
            | "tinyint" => ColumnType::Integer,
            "varchar" | "character varying" | "character" | "char" | "nvarchar" => {
                ColumnType::String
            }
            _ => ColumnType::Other(normalized),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::String => write!(f, "string"),
            ColumnType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Direction of a schema operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Remove,
}

/// Add or remove a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOp {
    pub action: Action,
    pub table: String,
    pub column: String,
    pub column_type: ColumnType,
    pub default: Option<String>,
    pub nullable: bool,
    /// Removing an absent column is a no-op instead of a conflict
    pub if_exists: bool,
}

impl ColumnOp {
    /// Create an add-column operation for a nullable column without default
    pub fn add(table: &str, column: &str, column_type: ColumnType) -> Self {
        Self {
            action: Action::Add,
            table: table.to_string(),
            column: column.to_string(),
            column_type,
            default: None,
            nullable: true,
            if_exists: false,
        }
    }

    /// Create a remove-column operation
    pub fn remove(table: &str, column: &str, column_type: ColumnType) -> Self {
        Self {
            action: Action::Remove,
            ..Self::add(table, column, column_type)
        }
    }

    /// Set a default value for the column
    pub fn with_default(mut self, default: Option<&str>) -> Self {
        self.default = default.map(str::to_string);
        self
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Tolerate the column being absent on removal
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

/// Add or remove an index over one or two columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOp {
    pub action: Action,
    pub table: String,
    pub columns: Vec<String>,
    pub name: Option<String>,
}

impl IndexOp {
    /// Create an add-index operation
    pub fn add(table: &str, columns: Vec<String>, name: Option<String>) -> Self {
        Self {
            action: Action::Add,
            table: table.to_string(),
            columns,
            name,
        }
    }

    /// Create a remove-index operation
    pub fn remove(table: &str, columns: Vec<String>, name: Option<String>) -> Self {
        Self {
            action: Action::Remove,
            ..Self::add(table, columns, name)
        }
    }
}

/// A single planned schema change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaOp {
    Column(ColumnOp),
    Index(IndexOp),
}

impl SchemaOp {
    /// Table the operation applies to
    pub fn table(&self) -> &str {
        match self {
            SchemaOp::Column(op) => &op.table,
            SchemaOp::Index(op) => &op.table,
        }
    }

    /// The operation that undoes this one
    pub fn inverse(&self) -> SchemaOp {
        match self {
            SchemaOp::Column(op) => {
                let action = match op.action {
                    Action::Add => Action::Remove,
                    Action::Remove => Action::Add,
                };
                SchemaOp::Column(ColumnOp {
                    action,
                    if_exists: false,
                    ..op.clone()
                })
            }
            SchemaOp::Index(op) => {
                let action = match op.action {
                    Action::Add => Action::Remove,
                    Action::Remove => Action::Add,
                };
                SchemaOp::Index(IndexOp {
                    action,
                    ..op.clone()
                })
            }
        }
    }
}

impl From<ColumnOp> for SchemaOp {
    fn from(op: ColumnOp) -> Self {
        SchemaOp::Column(op)
    }
}

impl From<IndexOp> for SchemaOp {
    fn from(op: IndexOp) -> Self {
        SchemaOp::Index(op)
    }
}

/// Ordered operations derived from one reference intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePlan {
    pub table: String,
    pub reference: String,
    pub ops: Vec<SchemaOp>,
}

impl ReferencePlan {
    /// Plan that undoes this one, in reverse order
    pub fn invert(&self) -> ReferencePlan {
        ReferencePlan {
            table: self.table.clone(),
            reference: self.reference.clone(),
            ops: self.ops.iter().rev().map(SchemaOp::inverse).collect(),
        }
    }

    pub fn column_ops(&self) -> impl Iterator<Item = &ColumnOp> {
        self.ops.iter().filter_map(|op| match op {
            SchemaOp::Column(op) => Some(op),
            SchemaOp::Index(_) => None,
        })
    }

    pub fn index_ops(&self) -> impl Iterator<Item = &IndexOp> {
        self.ops.iter().filter_map(|op| match op {
            SchemaOp::Index(op) => Some(op),
            SchemaOp::Column(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Represents a snapshot of database tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: IndexMap<String, Table>,
    pub schema_name: Option<String>,
}

impl DatabaseSchema {
    /// Create a new empty database schema
    pub fn new(schema_name: Option<String>) -> Self {
        Self {
            tables: IndexMap::new(),
            schema_name,
        }
    }

    /// Add a table to the schema
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}

/// Represents a database table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Add an index to the table
    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_named(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Indexes that reference the given column
    pub fn indexes_covering<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Index> {
        self.indexes
            .iter()
            .filter(move |i| i.columns.iter().any(|c| c == column))
    }
}

/// Represents a database column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<String>,
}

impl Column {
    /// Create a new nullable column with the given name and type
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: true,
            default: None,
        }
    }

    /// Set a default value for the column
    pub fn default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Represents an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

impl Index {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_unique: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_type_from_sql() {
        assert_eq!(ColumnType::from_sql_type("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("INTEGER"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("int(11)"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("bigint unsigned"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("character varying"), ColumnType::String);
        assert_eq!(ColumnType::from_sql_type("VARCHAR(255)"), ColumnType::String);
        assert_eq!(
            ColumnType::from_sql_type("text"),
            ColumnType::Other("text".to_string())
        );
    }

    #[test]
    fn test_plan_invert_reverses_order() {
        let plan = ReferencePlan {
            table: "test_models".to_string(),
            reference: "taggable".to_string(),
            ops: vec![
                ColumnOp::add("test_models", "taggable_id", ColumnType::Integer).into(),
                ColumnOp::add("test_models", "taggable_type", ColumnType::String).into(),
                IndexOp::add(
                    "test_models",
                    vec!["taggable_id".to_string(), "taggable_type".to_string()],
                    Some("idx".to_string()),
                )
                .into(),
            ],
        };

        let inverted = plan.invert();

        assert_eq!(
            inverted.ops,
            vec![
                IndexOp::remove(
                    "test_models",
                    vec!["taggable_id".to_string(), "taggable_type".to_string()],
                    Some("idx".to_string()),
                )
                .into(),
                ColumnOp::remove("test_models", "taggable_type", ColumnType::String).into(),
                ColumnOp::remove("test_models", "taggable_id", ColumnType::Integer).into(),
            ]
        );
        assert_eq!(inverted.invert(), plan);
    }

    #[test]
    fn test_op_serializes_with_kind_tag() {
        let op: SchemaOp = ColumnOp::add("t", "user_id", ColumnType::Integer).into();
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["kind"], "column");
        assert_eq!(json["action"], "add");
        assert_eq!(json["column_type"], "integer");
    }
}
