//! Whole-schema model.
//!
//! Validates a normalized schema and builds every entity in input order.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::info;

use super::entity::{Entity, SchemaLookup};
use super::input::NormalizedSchema;
use super::naming::qualify_table_name;
use super::types::{ScalarKind, TypeError};
use crate::utils::{
    camel_case_to_underscore, is_forbidden_identifier, is_identifier, rust_identifier,
};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid package '{0}'")]
    InvalidPackage(String),

    #[error("Invalid entity name '{0}'")]
    InvalidEntityName(String),

    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("Field '{field}' is declared more than once on {entity}")]
    DuplicateField { entity: String, field: String },

    #[error("Invalid field name '{field}' on {entity}: {reason}")]
    InvalidFieldName {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("{entity}.{field} references unknown entity '{referenced}'")]
    UnknownEntity {
        entity: String,
        field: String,
        referenced: String,
    },

    #[error("Invalid onDelete action '{value}' on {entity}.{field}")]
    InvalidOnDelete {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Invalid default value {value} on {entity}.{field}")]
    InvalidDefault {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Table {name} is produced by both {first} and {second}")]
    DuplicateTable {
        name: String,
        first: String,
        second: String,
    },

    #[error("Module {name} is produced by both {first} and {second}")]
    DuplicateModule {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid type on {entity}.{field}: {source}")]
    Type {
        entity: String,
        field: String,
        #[source]
        source: TypeError,
    },
}

/// Options that relax schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOptions {
    /// Accept references to entities the schema does not declare
    pub allow_undeclared_references: bool,
}

/// Canonical representation of a whole schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    pub package: String,
    /// Full path of the geometry type, if overridden
    pub geometry: Option<String>,
    /// Input order
    pub entities: Vec<Entity>,
}

impl SchemaModel {
    pub fn build(input: &NormalizedSchema, options: &ModelOptions) -> Result<Self, ModelError> {
        let package = input.package.trim();
        if package.is_empty() || !package.split("::").all(is_identifier) {
            return Err(ModelError::InvalidPackage(input.package.clone()));
        }

        let mut schemas = SchemaLookup::new();
        for (name, descriptor) in &input.models {
            if !is_identifier(name)
                || is_forbidden_identifier(name)
                || rust_identifier(name) != *name
                || is_forbidden_identifier(&camel_case_to_underscore(name))
                || ScalarKind::from_keyword(name).is_some()
            {
                return Err(ModelError::InvalidEntityName(name.clone()));
            }
            let schema = descriptor.schema.clone().or_else(|| input.schema.clone());
            if schemas.insert(name.clone(), schema).is_some() {
                return Err(ModelError::DuplicateEntity(name.clone()));
            }
        }

        let entities = input
            .models
            .iter()
            .map(|(name, descriptor)| {
                let schema = schemas.get(name).cloned().flatten();
                Entity::build(name, descriptor, schema.as_deref(), &schemas)
            })
            .collect::<Result<Vec<_>, _>>()?;

        check_name_collisions(&entities)?;
        if !options.allow_undeclared_references {
            check_references(&entities)?;
        }

        info!(
            package = %package,
            entities = entities.len(),
            "schema model built"
        );

        Ok(Self {
            package: package.to_string(),
            geometry: input.geometry.clone(),
            entities,
        })
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Distinct schemas in the order they are first used.
    pub fn schemas(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entities
            .iter()
            .filter_map(|e| e.schema_name.as_deref())
            .filter(|schema| seen.insert(*schema))
            .collect()
    }

    pub fn has_geometry(&self) -> bool {
        self.entities.iter().any(Entity::has_geometry)
    }

    pub fn has_last_modified(&self) -> bool {
        self.entities.iter().any(Entity::has_last_modified)
    }
}

/// Every entity and junction table needs its own table, and every entity its
/// own module file.
fn check_name_collisions(entities: &[Entity]) -> Result<(), ModelError> {
    let mut modules: HashMap<&str, &str> = HashMap::new();
    for entity in entities {
        if let Some(first) = modules.insert(&entity.table_name, &entity.name) {
            return Err(ModelError::DuplicateModule {
                name: entity.table_name.clone(),
                first: first.to_string(),
                second: entity.name.clone(),
            });
        }
    }

    let owned_tables = entities.iter().flat_map(|entity| {
        let junctions = entity.collections().filter_map(move |field| {
            let junction = field.junction()?;
            let table = qualify_table_name(&junction.table_name, junction.schema.as_deref());
            Some((table, format!("{}.{}", entity.name, field.name)))
        });
        std::iter::once((entity.qualified_table_name.clone(), entity.name.clone())).chain(junctions)
    });

    let mut tables: HashMap<String, String> = HashMap::new();
    for (table, owner) in owned_tables {
        let key = table.replace('"', "").to_uppercase();
        if let Some(first) = tables.insert(key, owner.clone()) {
            return Err(ModelError::DuplicateTable {
                name: table,
                first,
                second: owner,
            });
        }
    }
    Ok(())
}

fn check_references(entities: &[Entity]) -> Result<(), ModelError> {
    let declared: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    for entity in entities {
        for field in &entity.fields {
            let Some(target) = field.referenced_entity() else {
                continue;
            };
            if !declared.contains(target) {
                return Err(ModelError::UnknownEntity {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                    referenced: target.to_string(),
                });
            }
        }
    }
    Ok(())
}
