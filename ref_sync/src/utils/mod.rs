//! Utilities for RefSync
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{
    apply_naming_convention, format_sql_identifier, get_index_name, reference_id_column,
    reference_type_column,
};
