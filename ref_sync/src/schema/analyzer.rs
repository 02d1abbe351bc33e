//! Database schema analyzer
//!
//! Introspects the columns and secondary indexes of a single table, which
//! is all a reference migration needs to be checked against.

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::{FromRow, MySql, Pool, Postgres, Row, Sqlite};

use crate::db::connection::{DatabaseConnection, DatabasePool};
use crate::error::{Error, Result};
use crate::schema::types::{Column, ColumnType, DatabaseSchema, Index, Table};
use crate::utils::naming::format_sql_identifier;

/// Table analyzer trait
#[async_trait]
pub trait Analyzer {
    /// Read a table definition, or `None` if the table does not exist
    async fn analyze_table(&self, schema_name: Option<&str>, table: &str) -> Result<Option<Table>>;
}

/// Schema analyzer for table introspection
pub struct SchemaAnalyzer {
    connection: DatabaseConnection,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Analyze one table, failing with `SchemaConflict` if it does not exist
    pub async fn analyze_table(&self, table: &str) -> Result<Table> {
        let schema_name = self.connection.get_schema();

        let analyzed = match self.connection.pool() {
            DatabasePool::Postgres(pool) => {
                PostgresAnalyzer { pool }.analyze_table(schema_name, table).await?
            }
            DatabasePool::MySql(pool) => {
                MySqlAnalyzer { pool }.analyze_table(schema_name, table).await?
            }
            DatabasePool::Sqlite(pool) => {
                SqliteAnalyzer { pool }.analyze_table(schema_name, table).await?
            }
        };

        analyzed.ok_or_else(|| Error::SchemaConflict(format!("table '{}' does not exist", table)))
    }

    /// Snapshot holding just the given table
    pub async fn snapshot(&self, table: &str) -> Result<DatabaseSchema> {
        let mut schema = DatabaseSchema::new(self.connection.get_schema().map(str::to_string));
        schema.add_table(self.analyze_table(table).await?);

        tracing::debug!(table = table, "Analyzed table");
        Ok(schema)
    }
}

/// Normalise a column default as reported by the database to its plain value.
///
/// Strips string quoting and PostgreSQL casts, so `'Photo'::character varying`
/// becomes `Photo`. A NULL default is reported as `None`.
pub fn normalize_default(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    let lowered = value.to_lowercase();
    if lowered == "null" || lowered.starts_with("null::") {
        return None;
    }

    if value.starts_with('\'') {
        if let Some(pos) = value.rfind("'::") {
            value = &value[..pos + 1];
        }
    }

    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return Some(value[1..value.len() - 1].replace("''", "'"));
    }

    Some(value.to_string())
}

// Row types for information_schema queries
#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
}

impl From<ColumnRow> for Column {
    fn from(row: ColumnRow) -> Self {
        Column {
            name: row.column_name,
            column_type: ColumnType::from_sql_type(&row.data_type),
            nullable: row.is_nullable == "YES",
            default: row.column_default.as_deref().and_then(normalize_default),
        }
    }
}

#[derive(FromRow)]
struct IndexRow {
    index_name: String,
    column_name: String,
    is_unique: bool,
}

/// Group per-column index rows, preserving index and column order
fn collect_indexes(rows: Vec<IndexRow>) -> Vec<Index> {
    let mut indexes: IndexMap<String, Index> = IndexMap::new();

    for row in rows {
        indexes
            .entry(row.index_name.clone())
            .or_insert_with(|| Index {
                name: row.index_name.clone(),
                columns: Vec::new(),
                is_unique: row.is_unique,
            })
            .columns
            .push(row.column_name);
    }

    indexes.into_values().collect()
}

/// PostgreSQL table analyzer
struct PostgresAnalyzer<'a> {
    pool: &'a Pool<Postgres>,
}

#[async_trait]
impl<'a> Analyzer for PostgresAnalyzer<'a> {
    async fn analyze_table(&self, schema_name: Option<&str>, table: &str) -> Result<Option<Table>> {
        let schema = schema_name.unwrap_or("public");

        let sql = r#"
            SELECT
                column_name::text AS column_name,
                data_type::text AS data_type,
                is_nullable::text AS is_nullable,
                column_default::text AS column_default
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let column_rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool)
            .await?;

        if column_rows.is_empty() {
            return Ok(None);
        }

        let mut result = Table::new(table);
        for row in column_rows {
            result.add_column(row.into());
        }

        let sql = r#"
            SELECT
                i.relname::text AS index_name,
                a.attname::text AS column_name,
                ix.indisunique AS is_unique
            FROM
                pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
            JOIN pg_namespace n ON n.oid = t.relnamespace
            WHERE
                t.relname = $1
                AND n.nspname = $2
                AND NOT ix.indisprimary
            ORDER BY i.relname, array_position(ix.indkey::int2[], a.attnum)
        "#;

        let index_rows = sqlx::query_as::<_, IndexRow>(sql)
            .bind(table)
            .bind(schema)
            .fetch_all(self.pool)
            .await?;

        result.indexes = collect_indexes(index_rows);
        Ok(Some(result))
    }
}

/// MySQL table analyzer
struct MySqlAnalyzer<'a> {
    pool: &'a Pool<MySql>,
}

#[async_trait]
impl<'a> Analyzer for MySqlAnalyzer<'a> {
    async fn analyze_table(&self, schema_name: Option<&str>, table: &str) -> Result<Option<Table>> {
        // The connection's database unless a schema is configured
        let sql = r#"
            SELECT
                COLUMN_NAME AS column_name,
                DATA_TYPE AS data_type,
                IS_NULLABLE AS is_nullable,
                COLUMN_DEFAULT AS column_default
            FROM information_schema.columns
            WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ?
            ORDER BY ordinal_position
        "#;

        let column_rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(schema_name)
            .bind(table)
            .fetch_all(self.pool)
            .await?;

        if column_rows.is_empty() {
            return Ok(None);
        }

        let mut result = Table::new(table);
        for row in column_rows {
            result.add_column(row.into());
        }

        let sql = r#"
            SELECT
                INDEX_NAME AS index_name,
                COLUMN_NAME AS column_name,
                NON_UNIQUE AS non_unique
            FROM information_schema.statistics
            WHERE table_schema = COALESCE(?, DATABASE())
                AND table_name = ?
                AND INDEX_NAME <> 'PRIMARY'
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
        "#;

        let rows = sqlx::query(sql)
            .bind(schema_name)
            .bind(table)
            .fetch_all(self.pool)
            .await?;

        let mut index_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let non_unique: i64 = row.try_get("non_unique")?;
            index_rows.push(IndexRow {
                index_name: row.try_get("index_name")?,
                column_name: row.try_get("column_name")?,
                is_unique: non_unique == 0,
            });
        }

        result.indexes = collect_indexes(index_rows);
        Ok(Some(result))
    }
}

/// SQLite table analyzer
struct SqliteAnalyzer<'a> {
    pool: &'a Pool<Sqlite>,
}

#[async_trait]
impl<'a> Analyzer for SqliteAnalyzer<'a> {
    async fn analyze_table(&self, _schema_name: Option<&str>, table: &str) -> Result<Option<Table>> {
        let quoted = format_sql_identifier(table, "sqlite");

        let pragma = format!("PRAGMA table_info({})", quoted);
        let columns = sqlx::query(&pragma).fetch_all(self.pool).await?;

        if columns.is_empty() {
            return Ok(None);
        }

        let mut result = Table::new(table);
        for col in columns {
            let name: String = col.try_get("name")?;
            let data_type: String = col.try_get("type")?;
            let notnull: i64 = col.try_get("notnull")?;
            let dflt_value: Option<String> = col.try_get("dflt_value")?;

            result.add_column(Column {
                name,
                column_type: ColumnType::from_sql_type(&data_type),
                nullable: notnull == 0,
                default: dflt_value.as_deref().and_then(normalize_default),
            });
        }

        let pragma = format!("PRAGMA index_list({})", quoted);
        let index_list = sqlx::query(&pragma).fetch_all(self.pool).await?;

        let mut index_rows = Vec::new();
        for entry in index_list {
            let index_name: String = entry.try_get("name")?;
            let unique: i64 = entry.try_get("unique")?;
            let origin: String = entry.try_get("origin")?;
            if origin == "pk" {
                continue;
            }

            let pragma = format!(
                "PRAGMA index_info({})",
                format_sql_identifier(&index_name, "sqlite")
            );
            for info in sqlx::query(&pragma).fetch_all(self.pool).await? {
                let column_name: Option<String> = info.try_get("name")?;
                // Expression indexes have no column name
                if let Some(column_name) = column_name {
                    index_rows.push(IndexRow {
                        index_name: index_name.clone(),
                        column_name,
                        is_unique: unique != 0,
                    });
                }
            }
        }

        result.indexes = collect_indexes(index_rows);
        Ok(Some(result))
    }
}
