//! Normalized schema input.
//!
//! This is the document handed over by the description parser: a package name,
//! optional dialect options and an ordered map of entity descriptors. Entity
//! order is significant, so the `models` map is read entry by entry rather than
//! through a hash map.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read schema file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizedSchema {
    /// Module path the generated bindings live in (e.g. `crate::models`)
    pub package: String,

    /// Database schema (namespace) for every table
    #[serde(default)]
    pub schema: Option<String>,

    /// Path of the geometry type used by the bindings
    #[serde(default, alias = "jts")]
    pub geometry: Option<String>,

    /// Entity descriptors in declaration order
    #[serde(default, deserialize_with = "ordered_models")]
    pub models: Vec<(String, EntityDescriptor)>,
}

/// Declaration of a single entity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    #[serde(default)]
    pub fields: Vec<FieldDecl>,

    #[serde(default)]
    pub has_many: Vec<HasManyDecl>,

    #[serde(default)]
    pub constraints: Vec<ConstraintDecl>,

    #[serde(default)]
    pub defaults: Vec<DefaultDecl>,

    /// Marker traits the generated type implements
    #[serde(default)]
    pub implements: Vec<String>,

    /// Overrides the document-level schema for this entity
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HasManyDecl {
    pub name: String,
    pub model: String,
}

/// Out-of-band constraint on a field. Every attribute is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDecl {
    pub name: String,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub unique: Option<bool>,
    #[serde(default, alias = "size")]
    pub length: Option<u32>,
    #[serde(default)]
    pub srid: Option<u32>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl ConstraintDecl {
    /// Whether the column is required; `nullable: false` counts as required.
    pub fn is_required(&self) -> Option<bool> {
        self.required.or(self.nullable.map(|nullable| !nullable))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultDecl {
    pub name: String,
    pub value: serde_json::Value,
}

impl NormalizedSchema {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            ..Default::default()
        }
    }

    /// Parse a schema document from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a schema document from disk.
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let content = fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn with_entity(mut self, name: &str, descriptor: EntityDescriptor) -> Self {
        self.models.push((name.to_string(), descriptor));
        self
    }
}

impl EntityDescriptor {
    pub fn with_field(mut self, name: &str, field_type: &str) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            field_type: field_type.to_string(),
        });
        self
    }

    pub fn with_has_many(mut self, name: &str, model: &str) -> Self {
        self.has_many.push(HasManyDecl {
            name: name.to_string(),
            model: model.to_string(),
        });
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintDecl) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_default(mut self, name: &str, value: serde_json::Value) -> Self {
        self.defaults.push(DefaultDecl {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn implementing(mut self, capability: &str) -> Self {
        self.implements.push(capability.to_string());
        self
    }
}

fn ordered_models<'de, D>(deserializer: D) -> Result<Vec<(String, EntityDescriptor)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ModelsVisitor;

    impl<'de> Visitor<'de> for ModelsVisitor {
        type Value = Vec<(String, EntityDescriptor)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of entity names to entity descriptors")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut models = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, descriptor)) = map.next_entry::<String, EntityDescriptor>()? {
                models.push((name, descriptor));
            }
            Ok(models)
        }
    }

    deserializer.deserialize_map(ModelsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_models_keep_declaration_order() {
        let json = r#"
        {
            "package": "crate::models",
            "models": {
                "Zebra": { "fields": [{ "name": "stripes", "type": "int" }] },
                "Apple": {},
                "Mango": {}
            }
        }
        "#;
        let schema = NormalizedSchema::from_json_str(json).unwrap();
        let names: Vec<_> = schema.models.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Zebra", "Apple", "Mango"]);
    }

    #[rstest]
    fn test_descriptor_keys() {
        let json = r#"
        {
            "package": "crate::models",
            "schema": "app",
            "jts": "geo_types::Geometry",
            "models": {
                "User": {
                    "fields": [{ "name": "email", "type": "string" }],
                    "hasMany": [{ "name": "roles", "model": "Role" }],
                    "constraints": [{ "name": "email", "unique": true, "size": 128, "onDelete": "cascade" }],
                    "defaults": [{ "name": "email", "value": "nobody@example.com" }],
                    "implements": ["crate::Auditable"]
                }
            }
        }
        "#;
        let schema = NormalizedSchema::from_json_str(json).unwrap();
        assert_eq!(schema.schema.as_deref(), Some("app"));
        assert_eq!(schema.geometry.as_deref(), Some("geo_types::Geometry"));

        let (_, user) = &schema.models[0];
        assert_eq!(user.fields[0].field_type, "string");
        assert_eq!(user.has_many[0].model, "Role");
        assert_eq!(user.constraints[0].length, Some(128));
        assert_eq!(user.constraints[0].on_delete.as_deref(), Some("cascade"));
        assert_eq!(user.defaults[0].value, serde_json::json!("nobody@example.com"));
        assert_eq!(user.implements, vec!["crate::Auditable".to_string()]);
    }

    #[rstest]
    #[case(Some(true), None, Some(true))]
    #[case(None, Some(false), Some(true))]
    #[case(None, Some(true), Some(false))]
    #[case(Some(false), Some(false), Some(false))]
    #[case(None, None, None)]
    fn test_required_or_nullable(
        #[case] required: Option<bool>,
        #[case] nullable: Option<bool>,
        #[case] expected: Option<bool>,
    ) {
        let constraint = ConstraintDecl {
            name: "x".into(),
            required,
            nullable,
            ..Default::default()
        };
        assert_eq!(constraint.is_required(), expected);
    }

    #[rstest]
    fn test_missing_package_rejected() {
        let result = NormalizedSchema::from_json_str(r#"{ "models": {} }"#);
        assert!(matches!(result, Err(InputError::Json(_))));
    }

    #[rstest]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "package": "crate::models", "models": { "Phone": {} } }"#)
            .unwrap();
        let schema = NormalizedSchema::from_path(file.path()).unwrap();
        assert_eq!(schema.models.len(), 1);
    }

    #[rstest]
    fn test_from_missing_path() {
        let result = NormalizedSchema::from_path(Path::new("/nonexistent/schema.json"));
        assert!(matches!(result, Err(InputError::Io { .. })));
    }
}
