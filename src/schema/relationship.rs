//! Relationship derivation.
//!
//! Turns an entity-typed field into either a foreign key (single reference) or
//! a junction table requirement (collection reference). Scalars produce no
//! relationship.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::types::SemanticType;
use crate::utils::camel_case_to_underscore;

/// Referential action applied when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDelete {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::NoAction => "NO ACTION",
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::SetDefault => "SET DEFAULT",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

impl FromStr for OnDelete {
    type Err = String;

    /// Accepts any casing, with words separated by spaces or underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match normalized.as_str() {
            "NO ACTION" => Ok(OnDelete::NoAction),
            "CASCADE" => Ok(OnDelete::Cascade),
            "SET NULL" => Ok(OnDelete::SetNull),
            "SET DEFAULT" => Ok(OnDelete::SetDefault),
            "RESTRICT" => Ok(OnDelete::Restrict),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Serialize for OnDelete {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

/// Foreign key owned by a single-reference field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Column on the owning table (e.g. `phone_id`)
    pub column_name: String,
    /// Entity the column points at (e.g. `Phone`)
    pub referenced_entity: String,
    /// Upper-cased underscore table name of the referenced entity (e.g. `PHONE`)
    pub referenced_table_name: String,
    /// Schema the referenced table lives in
    pub referenced_schema: Option<String>,
    pub on_delete: OnDelete,
}

/// Junction table realizing a collection field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunctionTable {
    /// e.g. `USER_ROLE`
    pub table_name: String,
    pub schema: Option<String>,
    /// Column pointing at the owner (e.g. `USER_ID`)
    pub owner_column: String,
    /// Column pointing at the element (e.g. `ROLE_ID`, or `USER_ID_2` for self references)
    pub element_column: String,
    /// Lower-case table name of the owner
    pub owner_table: String,
    pub owner_schema: Option<String>,
    /// Lower-case table name of the element entity
    pub element_table: String,
    pub element_schema: Option<String>,
}

/// The entity that owns the field being resolved.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'a> {
    pub name: &'a str,
    pub table_name: &'a str,
    pub schema: Option<&'a str>,
}

/// Relationship derived from a field's semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    /// Scalars and scalar arrays
    None,
    /// Single reference; the foreign key is absent for self references
    Reference {
        entity: String,
        foreign_key: Option<ForeignKey>,
    },
    /// Collection stored in a junction table
    Collection {
        entity: String,
        junction: JunctionTable,
    },
}

/// Derives the relationship for a field.
///
/// # Arguments
/// * `owner` - Entity declaring the field
/// * `column_name` - Column the field maps to (already suffixed with `_id` for references)
/// * `semantic` - Parsed semantic type of the field
/// * `target_schema` - Schema of the referenced entity, if any
/// * `occurrence` - Number of earlier collections on the owner with the same element entity
pub fn resolve(
    owner: Owner<'_>,
    column_name: &str,
    semantic: &SemanticType,
    target_schema: Option<&str>,
    occurrence: usize,
) -> Relationship {
    match semantic {
        SemanticType::Entity(entity) => {
            let foreign_key = if entity == owner.name {
                debug!(entity = %owner.name, column = %column_name, "self reference, no foreign key");
                None
            } else {
                Some(ForeignKey {
                    column_name: column_name.to_string(),
                    referenced_entity: entity.clone(),
                    referenced_table_name: camel_case_to_underscore(entity).to_uppercase(),
                    referenced_schema: target_schema.map(str::to_string),
                    on_delete: OnDelete::Cascade,
                })
            };
            Relationship::Reference { entity: entity.clone(), foreign_key }
        }
        SemanticType::EntityArray(entity) => Relationship::Collection {
            entity: entity.clone(),
            junction: junction_table(owner, entity, target_schema, occurrence),
        },
        SemanticType::Scalar(_) | SemanticType::ScalarArray(_) => Relationship::None,
    }
}

/// Builds the junction table linking `owner` to `element`.
fn junction_table(
    owner: Owner<'_>,
    element: &str,
    element_schema: Option<&str>,
    occurrence: usize,
) -> JunctionTable {
    let left = owner.table_name.to_uppercase();
    let element_table = camel_case_to_underscore(element);
    let right = element_table.to_uppercase();

    let mut table_name = format!("{}_{}", left, right);
    if occurrence > 0 {
        table_name = format!("{}_{}", table_name, occurrence + 1);
    }

    let owner_column = format!("{}_ID", left);
    let mut element_column = format!("{}_ID", right);
    if element_column == owner_column {
        element_column.push_str("_2");
    }

    JunctionTable {
        table_name,
        schema: owner.schema.map(str::to_string),
        owner_column,
        element_column,
        owner_table: owner.table_name.to_string(),
        owner_schema: owner.schema.map(str::to_string),
        element_table,
        element_schema: element_schema.map(str::to_string),
    }
}
