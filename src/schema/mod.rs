//! Canonical schema representation.
//!
//! The normalized input is turned into a [`SchemaModel`]: entities with fully
//! resolved fields, column types, foreign keys and junction tables. Both
//! emitters work from this model only.

pub mod entity;
pub mod field;
pub mod input;
pub mod model;
pub mod naming;
pub mod relationship;
pub mod types;

pub use entity::Entity;
pub use field::{DefaultValue, Field, FieldKind};
pub use input::{EntityDescriptor, InputError, NormalizedSchema};
pub use model::{ModelError, ModelOptions, SchemaModel};
pub use relationship::{ForeignKey, JunctionTable, OnDelete, Relationship};
pub use types::{ColumnType, ObjectType, SemanticType, TypeError};
