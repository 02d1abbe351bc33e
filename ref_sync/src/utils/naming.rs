//! Naming utilities for RefSync
//!
//! This module provides identifier conventions for reference columns and
//! their indexes, plus dialect-aware quoting and truncation.

use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix of the integer column holding the referenced row id
pub const ID_SUFFIX: &str = "_id";

/// Suffix of the string column naming the referenced model of a polymorphic reference
pub const TYPE_SUFFIX: &str = "_type";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// Apply a naming convention to a string.
///
/// Names without upper-case letters are already snake_case and are kept
/// as written, digits and underscores included.
pub fn apply_naming_convention(name: &str, convention: &str) -> String {
    match convention {
        "snake_case" if !name.chars().any(|c| c.is_ascii_uppercase()) => name.to_string(),
        "snake_case" => name.to_snake_case(),
        "camel_case" => name.to_camel_case(),
        "pascal_case" => name.to_pascal_case(),
        "screaming_snake_case" => name.to_screaming_snake_case(),
        _ => name.to_string(), // Default: keep as is
    }
}

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Name of the id column for a reference
pub fn reference_id_column(reference: &str) -> String {
    format!("{}{}", reference, ID_SUFFIX)
}

/// Name of the type column for a polymorphic reference
pub fn reference_type_column(reference: &str) -> String {
    format!("{}{}", reference, TYPE_SUFFIX)
}

/// Get index name from table and columns according to pattern.
///
/// Columns are joined with `_and_`, so `["taggable_id", "taggable_type"]` on
/// `taggings` with the default pattern yields
/// `index_taggings_on_taggable_id_and_taggable_type`.
pub fn get_index_name(pattern: &str, table_name: &str, columns: &[String]) -> String {
    let columns_str = columns.join("_and_");

    format_name(pattern, &[("table", table_name), ("columns", &columns_str)])
}

/// Whether `name` is a plain SQL identifier that needs no escaping
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Truncate an identifier to fit database limits
pub fn truncate_identifier(name: &str, max_length: usize) -> String {
    // Room for the underscore and an 8 character hash
    if name.len() <= max_length || max_length <= 9 {
        return name.to_string();
    }

    let keep_length = max_length - 9;
    let hash = format!("{:x}", md5::compute(name.as_bytes()));

    let prefix: String = name.chars().take(keep_length).collect();
    format!("{}_{}", prefix, &hash[..8])
}

/// Get maximum identifier length for specific database
pub fn get_max_identifier_length(db_type: &str) -> usize {
    match db_type.to_lowercase().as_str() {
        "postgres" => 63,
        "mysql" => 64,
        "sqlite" => 2048,
        _ => 63,
    }
}

/// Format SQL identifier according to database style (quoted, backticks)
pub fn format_sql_identifier(name: &str, db_type: &str) -> String {
    match db_type.to_lowercase().as_str() {
        "mysql" => format!("`{}`", name.replace('`', "``")),
        _ => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Render a string as a single-quoted SQL literal
pub fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
