//! Reference definitions
//!
//! Options accepted by `add_reference` and friends, and the validated
//! [`ReferenceSpec`] the planner works from.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::naming::{is_valid_identifier, reference_id_column, reference_type_column};

/// Whether a reference carries a `<name>_type` column
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "PolymorphicRepr", into = "PolymorphicRepr")]
pub enum Polymorphic {
    #[default]
    None,
    Simple,
    WithDefault(String),
}

impl Polymorphic {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Polymorphic::None)
    }

    pub fn default_value(&self) -> Option<&str> {
        match self {
            Polymorphic::WithDefault(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PolymorphicRepr {
    Flag(bool),
    WithDefault { default: String },
}

impl From<PolymorphicRepr> for Polymorphic {
    fn from(repr: PolymorphicRepr) -> Self {
        match repr {
            PolymorphicRepr::Flag(false) => Polymorphic::None,
            PolymorphicRepr::Flag(true) => Polymorphic::Simple,
            PolymorphicRepr::WithDefault { default } => Polymorphic::WithDefault(default),
        }
    }
}

impl From<Polymorphic> for PolymorphicRepr {
    fn from(value: Polymorphic) -> Self {
        match value {
            Polymorphic::None => PolymorphicRepr::Flag(false),
            Polymorphic::Simple => PolymorphicRepr::Flag(true),
            Polymorphic::WithDefault(default) => PolymorphicRepr::WithDefault { default },
        }
    }
}

/// Whether a reference is indexed, and under which name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "IndexRepr", into = "IndexRepr")]
pub enum IndexSpec {
    #[default]
    None,
    Default,
    Named(String),
}

impl IndexSpec {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, IndexSpec::None)
    }

    pub fn explicit_name(&self) -> Option<&str> {
        match self {
            IndexSpec::Named(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IndexRepr {
    Flag(bool),
    Named { name: String },
}

impl From<IndexRepr> for IndexSpec {
    fn from(repr: IndexRepr) -> Self {
        match repr {
            IndexRepr::Flag(false) => IndexSpec::None,
            IndexRepr::Flag(true) => IndexSpec::Default,
            IndexRepr::Named { name } => IndexSpec::Named(name),
        }
    }
}

impl From<IndexSpec> for IndexRepr {
    fn from(value: IndexSpec) -> Self {
        match value {
            IndexSpec::None => IndexRepr::Flag(false),
            IndexSpec::Default => IndexRepr::Flag(true),
            IndexSpec::Named(name) => IndexRepr::Named { name },
        }
    }
}

/// Options for adding or removing a reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceOptions {
    pub polymorphic: Polymorphic,
    pub index: IndexSpec,
    #[serde(rename = "null")]
    pub nullable: bool,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            polymorphic: Polymorphic::None,
            index: IndexSpec::None,
            nullable: true,
        }
    }
}

impl ReferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `<name>_type` column without default
    pub fn polymorphic(mut self) -> Self {
        self.polymorphic = Polymorphic::Simple;
        self
    }

    /// Add a `<name>_type` column defaulting to `default`
    pub fn polymorphic_with_default(mut self, default: &str) -> Self {
        self.polymorphic = Polymorphic::WithDefault(default.to_string());
        self
    }

    /// Index the reference under the generated name
    pub fn index(mut self) -> Self {
        self.index = IndexSpec::Default;
        self
    }

    /// Index the reference under an explicit name
    pub fn index_named(mut self, name: &str) -> Self {
        self.index = IndexSpec::Named(name.to_string());
        self
    }

    /// Set whether the reference columns accept NULL
    pub fn null(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// A validated reference on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSpec {
    pub table: String,
    pub name: String,
    pub polymorphic: Polymorphic,
    pub index: IndexSpec,
    pub nullable: bool,
}

impl ReferenceSpec {
    /// Build a spec, rejecting malformed table, reference or index names
    pub fn new(table: &str, name: &str, options: ReferenceOptions) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::InvalidSpecification(
                "table name must not be empty".to_string(),
            ));
        }
        if !is_valid_identifier(table) {
            return Err(Error::InvalidSpecification(format!(
                "'{}' is not a valid table name",
                table
            )));
        }
        if name.is_empty() {
            return Err(Error::InvalidSpecification(
                "reference name must not be empty".to_string(),
            ));
        }
        if !is_valid_identifier(name) {
            return Err(Error::InvalidSpecification(format!(
                "'{}' is not a valid reference name",
                name
            )));
        }
        if let IndexSpec::Named(index_name) = &options.index {
            if index_name.trim().is_empty() {
                return Err(Error::InvalidSpecification(format!(
                    "index name for reference '{}' must not be empty",
                    name
                )));
            }
        }

        Ok(Self {
            table: table.to_string(),
            name: name.to_string(),
            polymorphic: options.polymorphic,
            index: options.index,
            nullable: options.nullable,
        })
    }

    pub fn id_column(&self) -> String {
        reference_id_column(&self.name)
    }

    pub fn type_column(&self) -> String {
        reference_type_column(&self.name)
    }

    /// Columns an index on this reference covers, in order
    pub fn index_columns(&self) -> Vec<String> {
        if self.polymorphic.is_enabled() {
            vec![self.id_column(), self.type_column()]
        } else {
            vec![self.id_column()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_from_json_shapes() {
        let options: ReferenceOptions =
            serde_json::from_str(r#"{"polymorphic": {"default": "Photo"}, "index": true}"#).unwrap();
        assert_eq!(options.polymorphic, Polymorphic::WithDefault("Photo".to_string()));
        assert_eq!(options.index, IndexSpec::Default);
        assert!(options.nullable);

        let options: ReferenceOptions =
            serde_json::from_str(r#"{"index": {"name": "index_taggings_on_tag_id"}, "null": false}"#)
                .unwrap();
        assert_eq!(options.polymorphic, Polymorphic::None);
        assert_eq!(options.index, IndexSpec::Named("index_taggings_on_tag_id".to_string()));
        assert!(!options.nullable);

        let options: ReferenceOptions = serde_json::from_str(r#"{"polymorphic": false}"#).unwrap();
        assert_eq!(options, ReferenceOptions::default());
    }

    #[test]
    fn test_options_from_toml_shape() {
        let options: ReferenceOptions = toml::from_str(
            r#"
            polymorphic = true
            index = { name = "custom" }
            "#,
        )
        .unwrap();

        assert_eq!(options, ReferenceOptions::new().polymorphic().index_named("custom"));
    }

    #[test]
    fn test_options_serialize_to_dsl_shape() {
        let options = ReferenceOptions::new().polymorphic_with_default("Photo").index();
        let json = serde_json::to_value(&options).unwrap();

        assert_eq!(json["polymorphic"]["default"], "Photo");
        assert_eq!(json["index"], true);
        assert_eq!(json["null"], true);
    }

    #[test]
    fn test_spec_rejects_empty_name() {
        let err = ReferenceSpec::new("test_models", "", ReferenceOptions::new()).unwrap_err();
        assert!(err.is_invalid_specification());
    }

    #[test]
    fn test_spec_rejects_bad_identifiers() {
        assert!(ReferenceSpec::new("", "user", ReferenceOptions::new())
            .unwrap_err()
            .is_invalid_specification());
        assert!(ReferenceSpec::new("test_models", "user id", ReferenceOptions::new())
            .unwrap_err()
            .is_invalid_specification());
        assert!(ReferenceSpec::new("test models", "user", ReferenceOptions::new())
            .unwrap_err()
            .is_invalid_specification());
    }

    #[test]
    fn test_spec_rejects_blank_index_name() {
        let err = ReferenceSpec::new("test_models", "tag", ReferenceOptions::new().index_named(" "))
            .unwrap_err();
        assert!(err.is_invalid_specification());
    }

    #[test]
    fn test_index_columns() {
        let spec = ReferenceSpec::new("test_models", "taggable", ReferenceOptions::new()).unwrap();
        assert_eq!(spec.index_columns(), vec!["taggable_id".to_string()]);

        let spec =
            ReferenceSpec::new("test_models", "taggable", ReferenceOptions::new().polymorphic())
                .unwrap();
        assert_eq!(
            spec.index_columns(),
            vec!["taggable_id".to_string(), "taggable_type".to_string()]
        );
    }
}
