//! Entity fields.

use serde_json::Value;

use super::relationship::{self, ForeignKey, JunctionTable, Owner, Relationship};
use super::types::{ColumnType, ObjectType, ScalarKind, SemanticType};
use crate::utils::{camel_case_to_underscore, rust_identifier};

/// Name of the auto-maintained modification timestamp.
pub const LAST_MODIFIED: &str = "lastModified";

/// Methods every generated binding defines.
pub const GENERATED_METHODS: &[&str] = &[
    "new",
    "with_id",
    "id",
    "load",
    "from_row",
    "from_document",
    "save",
    "to_document",
];

/// The one classification a field has, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    EntityReference,
    ScalarArray,
    EntityArray,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::EntityReference => "reference",
            FieldKind::ScalarArray => "scalar[]",
            FieldKind::EntityArray => "collection",
        }
    }
}

/// Column default taken from a `default` constraint or a `defaults` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// String value; quoted in SQL unless it looks like a function call
    Text(String),
    /// Number or boolean, emitted verbatim
    Literal(String),
}

impl DefaultValue {
    /// Converts a JSON value. Only strings, numbers and booleans are defaults.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(DefaultValue::Text(s.clone())),
            Value::Number(n) => Some(DefaultValue::Literal(n.to_string())),
            Value::Bool(b) => Some(DefaultValue::Literal(b.to_string())),
            _ => None,
        }
    }

    /// A text default such as `now()` is a SQL expression, not a literal.
    pub fn is_function_call(&self) -> bool {
        match self {
            DefaultValue::Text(s) => s.contains('(') && s.ends_with(')'),
            DefaultValue::Literal(_) => false,
        }
    }
}

/// One attribute or relationship of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared name (e.g. `postalCode`)
    pub name: String,
    /// Declared type string (e.g. `string`, `Phone`, `Role[]`)
    pub semantic_type: String,
    pub semantic: SemanticType,
    pub object_type: ObjectType,
    /// Underscore column name, with `_id` appended for single references
    pub column_name: String,
    /// `None` for collections
    pub column_type: Option<ColumnType>,
    pub required: bool,
    pub unique: bool,
    pub length: Option<u32>,
    pub srid: Option<u32>,
    pub default_value: Option<DefaultValue>,
    pub relationship: Relationship,
}

impl Field {
    /// Builds a field from an already parsed semantic type.
    ///
    /// # Arguments
    /// * `owner` - Entity declaring the field
    /// * `name` - Declared field name
    /// * `semantic_type` - Raw declared type string, kept for reporting
    /// * `semantic` - Parsed form of `semantic_type`
    /// * `target_schema` - Schema of the referenced entity, for entity-typed fields
    /// * `occurrence` - Earlier collections on the owner with the same element entity
    pub fn new(
        owner: Owner<'_>,
        name: &str,
        semantic_type: &str,
        semantic: SemanticType,
        target_schema: Option<&str>,
        occurrence: usize,
    ) -> Self {
        let mapping = semantic.mapping();
        let mut column_name = camel_case_to_underscore(name);
        if matches!(semantic, SemanticType::Entity(_)) {
            column_name.push_str("_id");
        }

        let relationship =
            relationship::resolve(owner, &column_name, &semantic, target_schema, occurrence);

        Self {
            name: name.to_string(),
            semantic_type: semantic_type.to_string(),
            semantic,
            object_type: mapping.object_type,
            column_name,
            column_type: mapping.column_type,
            required: false,
            unique: false,
            length: None,
            srid: None,
            default_value: None,
            relationship,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self.semantic {
            SemanticType::Scalar(_) => FieldKind::Scalar,
            SemanticType::ScalarArray(_) => FieldKind::ScalarArray,
            SemanticType::Entity(_) => FieldKind::EntityReference,
            SemanticType::EntityArray(_) => FieldKind::EntityArray,
        }
    }

    pub fn is_model_reference(&self) -> bool {
        self.kind() == FieldKind::EntityReference
    }

    pub fn is_array_of_model(&self) -> bool {
        self.kind() == FieldKind::EntityArray
    }

    /// Entity named by the field's type, for references and collections.
    pub fn referenced_entity(&self) -> Option<&str> {
        self.semantic.referenced_entity()
    }

    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        match &self.relationship {
            Relationship::Reference { foreign_key, .. } => foreign_key.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn foreign_key_mut(&mut self) -> Option<&mut ForeignKey> {
        match &mut self.relationship {
            Relationship::Reference { foreign_key, .. } => foreign_key.as_mut(),
            _ => None,
        }
    }

    pub fn junction(&self) -> Option<&JunctionTable> {
        match &self.relationship {
            Relationship::Collection { junction, .. } => Some(junction),
            _ => None,
        }
    }

    /// True for the timestamp maintained by the update trigger.
    pub fn is_last_modified(&self) -> bool {
        self.name == LAST_MODIFIED && self.object_type == ObjectType::Date
    }

    pub fn is_password(&self) -> bool {
        self.object_type == ObjectType::Password
    }

    pub fn is_boolean(&self) -> bool {
        self.semantic == SemanticType::Scalar(ScalarKind::Boolean)
    }

    pub fn is_geometry(&self) -> bool {
        self.column_type.as_ref().is_some_and(ColumnType::is_geometry)
    }

    /// Underscore form of the declared name, without the `_id` suffix.
    pub fn snake_name(&self) -> String {
        camel_case_to_underscore(&self.name)
    }

    /// Identifier of the struct field in generated code.
    pub fn rust_name(&self) -> String {
        rust_identifier(&self.snake_name())
    }

    /// Getter name. Booleans read as `is_x`; passwords have no getter.
    pub fn accessor_name(&self) -> Option<String> {
        let snake = self.snake_name();
        if self.is_password() {
            None
        } else if self.is_boolean() && !snake.starts_with("is_") {
            Some(format!("is_{}", snake))
        } else {
            Some(snake)
        }
    }

    /// Setter name; the trigger-maintained timestamp has none.
    pub fn mutator_name(&self) -> Option<String> {
        (!self.is_last_modified()).then(|| format!("set_{}", self.snake_name()))
    }

    /// Single-item appender for collections.
    pub fn appender_name(&self) -> Option<String> {
        self.is_array_of_model()
            .then(|| format!("add_to_{}", self.snake_name()))
    }

    /// Plaintext check replacing the getter of password fields.
    pub fn authenticator_name(&self) -> Option<String> {
        self.is_password()
            .then(|| format!("authenticate_{}", self.snake_name()))
    }

    /// Every method the generated binding defines for this field.
    pub fn method_names(&self) -> Vec<String> {
        [
            self.accessor_name(),
            self.mutator_name(),
            self.appender_name(),
            self.authenticator_name(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
