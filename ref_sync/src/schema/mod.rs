//! Schema module for RefSync
//!
//! This module plans reference changes, checks them against schema
//! snapshots and renders them as SQL.

pub mod analyzer;
pub mod catalog;
pub mod generator;
pub mod planner;
pub mod reference;
pub mod types;

// Re-export key types
pub use analyzer::SchemaAnalyzer;
pub use catalog::SchemaCatalog;
pub use generator::{DdlGenerator, Dialect};
pub use planner::ReferencePlanner;
pub use reference::{IndexSpec, Polymorphic, ReferenceOptions, ReferenceSpec};
pub use types::{
    Action, Column, ColumnOp, ColumnType, DatabaseSchema, Index, IndexOp, ReferencePlan, SchemaOp,
    Table,
};
