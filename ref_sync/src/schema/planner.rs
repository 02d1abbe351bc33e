//! Reference migration planner
//!
//! Translates `add_reference` / `remove_reference` intents into ordered
//! column and index operations. The planner never looks at a live schema;
//! applying the plan, and reporting conflicts, is up to an executor.

use std::collections::HashSet;

use crate::config::NamingConfig;
use crate::error::{Error, Result};
use crate::schema::reference::{ReferenceOptions, ReferenceSpec};
use crate::schema::types::{ColumnOp, ColumnType, IndexOp, ReferencePlan, SchemaOp};
use crate::utils::naming::{
    apply_naming_convention, get_index_name, get_max_identifier_length, truncate_identifier,
};

/// Plans reference column and index changes
#[derive(Debug, Clone)]
pub struct ReferencePlanner {
    naming: NamingConfig,
    max_identifier_length: usize,
    known_indexes: HashSet<String>,
}

impl Default for ReferencePlanner {
    fn default() -> Self {
        Self::new(&NamingConfig::default(), "postgres")
    }
}

impl ReferencePlanner {
    /// Create a planner for the given naming rules and database driver
    pub fn new(naming: &NamingConfig, driver: &str) -> Self {
        let max_identifier_length = naming
            .max_identifier_length
            .unwrap_or_else(|| get_max_identifier_length(driver));

        Self {
            naming: naming.clone(),
            max_identifier_length,
            known_indexes: HashSet::new(),
        }
    }

    /// Index identifiers an explicit index name must not reuse
    pub fn with_known_indexes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_indexes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validate a reference and normalise its name to the column convention
    pub fn spec(&self, table: &str, name: &str, options: ReferenceOptions) -> Result<ReferenceSpec> {
        let spec = ReferenceSpec::new(table, name, options)?;
        let normalized = apply_naming_convention(&spec.name, &self.naming.column_style);

        if normalized == spec.name {
            return Ok(spec);
        }

        ReferenceSpec::new(
            table,
            &normalized,
            ReferenceOptions {
                polymorphic: spec.polymorphic,
                index: spec.index,
                nullable: spec.nullable,
            },
        )
    }

    /// Plan the columns, and optionally the index, for a new reference.
    ///
    /// Columns always come before the index that covers them.
    pub fn add_reference(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<ReferencePlan> {
        let spec = self.spec(table, name, options)?;
        let index_name = self.index_name_for(&spec)?;

        let mut ops: Vec<SchemaOp> = Vec::with_capacity(3);
        ops.push(
            ColumnOp::add(&spec.table, &spec.id_column(), ColumnType::Integer)
                .nullable(spec.nullable)
                .into(),
        );

        if spec.polymorphic.is_enabled() {
            ops.push(
                ColumnOp::add(&spec.table, &spec.type_column(), ColumnType::String)
                    .with_default(spec.polymorphic.default_value())
                    .nullable(spec.nullable)
                    .into(),
            );
        }

        if let Some(index_name) = index_name {
            ops.push(IndexOp::add(&spec.table, spec.index_columns(), Some(index_name)).into());
        }

        tracing::debug!(
            table = %spec.table,
            reference = %spec.name,
            op_count = ops.len(),
            "Planned reference addition"
        );

        Ok(ReferencePlan {
            table: spec.table,
            reference: spec.name,
            ops,
        })
    }

    /// Plan the removal of a reference.
    ///
    /// Only `<name>_id` is dropped unless the options are polymorphic, in
    /// which case `<name>_type` is dropped too if it exists. Indexes on the
    /// removed columns go with them.
    pub fn remove_reference(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<ReferencePlan> {
        let spec = self.spec(table, name, options)?;

        let mut ops: Vec<SchemaOp> = Vec::with_capacity(2);
        ops.push(ColumnOp::remove(&spec.table, &spec.id_column(), ColumnType::Integer).into());

        if spec.polymorphic.is_enabled() {
            ops.push(
                ColumnOp::remove(&spec.table, &spec.type_column(), ColumnType::String)
                    .with_default(spec.polymorphic.default_value())
                    .if_exists()
                    .into(),
            );
        }

        tracing::debug!(
            table = %spec.table,
            reference = %spec.name,
            op_count = ops.len(),
            "Planned reference removal"
        );

        Ok(ReferencePlan {
            table: spec.table,
            reference: spec.name,
            ops,
        })
    }

    /// Alias of [`ReferencePlanner::add_reference`]
    pub fn add_belongs_to(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<ReferencePlan> {
        self.add_reference(table, name, options)
    }

    /// Alias of [`ReferencePlanner::remove_reference`]
    pub fn remove_belongs_to(
        &self,
        table: &str,
        name: &str,
        options: ReferenceOptions,
    ) -> Result<ReferencePlan> {
        self.remove_reference(table, name, options)
    }

    /// Resolve the index name for a spec, if it asks for an index
    fn index_name_for(&self, spec: &ReferenceSpec) -> Result<Option<String>> {
        if !spec.index.is_enabled() {
            return Ok(None);
        }

        if let Some(name) = spec.index.explicit_name() {
            if name.len() > self.max_identifier_length {
                return Err(Error::InvalidSpecification(format!(
                    "index name '{}' on table '{}' is too long; the limit is {} characters",
                    name, spec.table, self.max_identifier_length
                )));
            }
            if self.known_indexes.contains(name) {
                return Err(Error::InvalidSpecification(format!(
                    "index name '{}' on table '{}' already exists",
                    name, spec.table
                )));
            }
            return Ok(Some(name.to_string()));
        }

        let generated = get_index_name(&self.naming.index_pattern, &spec.table, &spec.index_columns());
        let name = truncate_identifier(&generated, self.max_identifier_length);
        if name.len() > self.max_identifier_length {
            return Err(Error::InvalidSpecification(format!(
                "index name '{}' on table '{}' cannot be shortened to {} characters",
                generated, spec.table, self.max_identifier_length
            )));
        }

        Ok(Some(name))
    }
}
