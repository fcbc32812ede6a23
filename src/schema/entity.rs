//! Entity construction.
//!
//! An entity is built in four steps:
//! 1. fields from the `fields` declarations (an explicit `id` is skipped)
//! 2. collection fields from the `hasMany` declarations
//! 3. constraint overrides, matched by field name
//! 4. default overrides, matched by field name
//!
//! Constraints and defaults naming a field that does not exist are skipped
//! with a warning.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use super::field::{DefaultValue, Field, GENERATED_METHODS};
use super::input::{ConstraintDecl, DefaultDecl, EntityDescriptor};
use super::model::ModelError;
use super::naming::qualify_table_name;
use super::relationship::{OnDelete, Owner};
use super::types::SemanticType;
use crate::utils::{camel_case_to_underscore, is_forbidden_identifier, is_identifier};

/// Name of the implicit primary key.
pub const PRIMARY_KEY: &str = "id";

/// Schema of every declared entity, keyed by entity name.
pub type SchemaLookup = HashMap<String, Option<String>>;

/// One schema-level type.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    /// Lower-case underscore name (e.g. `phone_number`)
    pub table_name: String,
    pub schema_name: Option<String>,
    /// Escaped, schema-qualified name used in DDL (e.g. `APP.CONTACT`)
    pub qualified_table_name: String,
    /// Declaration order; never contains the primary key
    pub fields: Vec<Field>,
    /// Marker traits implemented by the generated type
    pub capabilities: BTreeSet<String>,
    /// Constraint and default entries that were skipped
    pub warnings: Vec<String>,
}

impl Entity {
    /// Builds an entity from its descriptor.
    ///
    /// `schemas` maps every declared entity to its schema. References to
    /// entities missing from it are assumed to live in this entity's schema.
    pub fn build(
        name: &str,
        descriptor: &EntityDescriptor,
        schema_name: Option<&str>,
        schemas: &SchemaLookup,
    ) -> Result<Self, ModelError> {
        let table_name = camel_case_to_underscore(name);
        let mut entity = Entity {
            name: name.to_string(),
            qualified_table_name: qualify_table_name(&table_name, schema_name),
            table_name,
            schema_name: schema_name.map(str::to_string),
            fields: Vec::new(),
            capabilities: descriptor.implements.iter().cloned().collect(),
            warnings: Vec::new(),
        };

        let declared = descriptor
            .fields
            .iter()
            .filter(|decl| !decl.name.eq_ignore_ascii_case(PRIMARY_KEY))
            .map(|decl| (decl.name.as_str(), decl.field_type.clone()));
        let collections = descriptor
            .has_many
            .iter()
            .map(|decl| (decl.name.as_str(), format!("{}[]", decl.model)));

        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for (field_name, raw_type) in declared.chain(collections) {
            let field = entity.build_field(field_name, &raw_type, schemas, &mut occurrences)?;
            entity.fields.push(field);
        }
        entity.check_duplicates()?;

        for constraint in &descriptor.constraints {
            entity.apply_constraint(constraint)?;
        }
        for default in &descriptor.defaults {
            entity.apply_default(default)?;
        }

        debug!(
            entity = %entity.name,
            fields = entity.fields.len(),
            warnings = entity.warnings.len(),
            "built entity"
        );
        Ok(entity)
    }

    fn build_field(
        &self,
        field_name: &str,
        raw_type: &str,
        schemas: &SchemaLookup,
        occurrences: &mut HashMap<String, usize>,
    ) -> Result<Field, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidFieldName {
            entity: self.name.clone(),
            field: field_name.to_string(),
            reason: reason.to_string(),
        };
        if !is_identifier(field_name) {
            return Err(invalid("not an identifier"));
        }
        let snake = camel_case_to_underscore(field_name);
        if is_forbidden_identifier(&snake) {
            return Err(invalid("reserved identifier"));
        }
        if snake == PRIMARY_KEY {
            return Err(invalid("collides with the primary key"));
        }

        let semantic = SemanticType::parse(raw_type).map_err(|source| ModelError::Type {
            entity: self.name.clone(),
            field: field_name.to_string(),
            source,
        })?;

        let target_schema =
            semantic
                .referenced_entity()
                .and_then(|target| match schemas.get(target) {
                    Some(schema) => schema.clone(),
                    None => self.schema_name.clone(),
                });

        let occurrence = match &semantic {
            SemanticType::EntityArray(element) => {
                let count = occurrences.entry(element.clone()).or_insert(0);
                *count += 1;
                *count - 1
            }
            _ => 0,
        };

        let owner = Owner {
            name: &self.name,
            table_name: &self.table_name,
            schema: self.schema_name.as_deref(),
        };
        Ok(Field::new(
            owner,
            field_name,
            raw_type,
            semantic,
            target_schema.as_deref(),
            occurrence,
        ))
    }

    /// Two fields may share neither a Rust name nor a column name, and the
    /// methods generated for them must not collide.
    fn check_duplicates(&self) -> Result<(), ModelError> {
        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for field in &self.fields {
            let clash = !names.insert(field.snake_name())
                || (field.column_type.is_some() && !columns.insert(field.column_name.clone()));
            if clash {
                return Err(ModelError::DuplicateField {
                    entity: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let mut methods: HashSet<String> =
            GENERATED_METHODS.iter().map(|m| m.to_string()).collect();
        for field in &self.fields {
            for method in field.method_names() {
                if !methods.insert(method.clone()) {
                    return Err(ModelError::InvalidFieldName {
                        entity: self.name.clone(),
                        field: field.name.clone(),
                        reason: format!("generated method '{}' collides", method),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply_constraint(&mut self, constraint: &ConstraintDecl) -> Result<(), ModelError> {
        let entity = self.name.clone();
        let Some(index) = self.field_index(&constraint.name) else {
            self.skip("constraint", &constraint.name);
            return Ok(());
        };

        let on_delete = constraint
            .on_delete
            .as_deref()
            .map(|raw| {
                raw.parse::<OnDelete>().map_err(|value| ModelError::InvalidOnDelete {
                    entity: entity.clone(),
                    field: constraint.name.clone(),
                    value,
                })
            })
            .transpose()?;
        let default_value = constraint
            .default
            .as_ref()
            .map(|value| self.parse_default(&constraint.name, value))
            .transpose()?;

        let field = &mut self.fields[index];
        if let Some(required) = constraint.is_required() {
            field.required = required;
        }
        if let Some(unique) = constraint.unique {
            field.unique = unique;
        }
        if let Some(length) = constraint.length {
            let applied = field
                .column_type
                .as_mut()
                .is_some_and(|column| column.apply_length(length));
            if applied {
                field.length = Some(length);
            } else {
                warn!(%entity, field = %field.name, length, "length ignored on non-character column");
            }
        }
        if let Some(srid) = constraint.srid {
            let applied = field
                .column_type
                .as_mut()
                .is_some_and(|column| column.apply_srid(srid));
            if applied {
                field.srid = Some(srid);
            } else {
                warn!(%entity, field = %field.name, srid, "srid ignored on non-geometry column");
            }
        }
        if let Some(action) = on_delete {
            let is_reference = field.is_model_reference();
            match field.foreign_key_mut() {
                Some(fk) => fk.on_delete = action,
                None if is_reference => {
                    debug!(%entity, field = %field.name, "onDelete ignored on self reference")
                }
                None => warn!(%entity, field = %field.name, "onDelete ignored on non-reference field"),
            }
        }
        if let Some(value) = default_value {
            set_default(&entity, field, value);
        }
        Ok(())
    }

    fn apply_default(&mut self, default: &DefaultDecl) -> Result<(), ModelError> {
        let Some(index) = self.field_index(&default.name) else {
            self.skip("default", &default.name);
            return Ok(());
        };
        let value = self.parse_default(&default.name, &default.value)?;
        let entity = self.name.clone();
        set_default(&entity, &mut self.fields[index], value);
        Ok(())
    }

    fn parse_default(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<DefaultValue, ModelError> {
        DefaultValue::from_json(value).ok_or_else(|| ModelError::InvalidDefault {
            entity: self.name.clone(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    fn skip(&mut self, what: &str, field: &str) {
        warn!(entity = %self.name, %field, "{} names an unknown field, skipped", what);
        self.warnings
            .push(format!("{} on unknown field '{}' skipped", what, field));
    }

    fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields stored as a column on the entity's own table.
    pub fn columns(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.column_type.is_some())
    }

    /// Fields stored in a junction table.
    pub fn collections(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_array_of_model())
    }

    pub fn has_last_modified(&self) -> bool {
        self.fields.iter().any(Field::is_last_modified)
    }

    pub fn has_geometry(&self) -> bool {
        self.fields.iter().any(Field::is_geometry)
    }

    /// Other entities named by reference or collection fields, first occurrence first.
    pub fn referenced_entities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter_map(Field::referenced_entity)
            .filter(|target| *target != self.name && seen.insert(*target))
            .collect()
    }
}

fn set_default(entity: &str, field: &mut Field, value: DefaultValue) {
    if field.column_type.is_none() {
        warn!(%entity, field = %field.name, "default ignored on collection field");
        return;
    }
    field.default_value = Some(value);
}
