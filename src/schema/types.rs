//! Semantic type mapping.
//!
//! Maps the type keyword of a field declaration onto the object type used by
//! the generated Rust bindings and the PostgreSQL column type used by the DDL.
//!
//! | semantic type            | object type      | column type                  |
//! |--------------------------|------------------|------------------------------|
//! | int                      | Integer          | integer                      |
//! | int[]                    | Integer array    | integer[]                    |
//! | long                     | Long             | bigint                       |
//! | double / float           | Double           | double precision             |
//! | decimal / numeric        | Decimal          | numeric                      |
//! | text / string / password | String           | varchar                      |
//! | text[] / string[]        | String array     | varchar[]                    |
//! | char                     | String           | char(1)                      |
//! | boolean                  | Boolean          | boolean                      |
//! | date                     | Date             | timestamp with time zone     |
//! | binary                   | byte sequence    | bytea                        |
//! | json                     | JSON object      | jsonb                        |
//! | geo                      | Geometry         | geometry(Geometry,4326)      |
//! | geometry                 | Geometry         | geometry(GeometryZ)          |
//! | `Entity`                 | Entity reference | bigint                       |
//! | `Entity[]`               | Vec of Entity    | none (junction table)        |
//!
//! Keywords are matched case-insensitively. Anything that is not a keyword is
//! taken to be an entity name; whether that entity exists is checked by the
//! schema model, not here.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::utils::is_identifier;

/// Default spatial reference id for `geo` columns.
pub const DEFAULT_SRID: u32 = 4326;

const ARRAY_MARKER: &str = "[]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Field type is empty")]
    Empty,

    #[error("Invalid field type '{0}'")]
    InvalidSyntax(String),

    #[error("Type '{0}' cannot be used as an array")]
    UnsupportedArrayType(String),
}

/// Scalar type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Int,
    Long,
    Double,
    Decimal,
    String,
    Password,
    Char,
    Boolean,
    Date,
    Binary,
    Json,
    Geo,
    Geometry,
}

impl ScalarKind {
    /// Looks up a reserved keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword.to_ascii_lowercase().as_str() {
            "int" => ScalarKind::Int,
            "long" => ScalarKind::Long,
            "double" | "float" => ScalarKind::Double,
            "decimal" | "numeric" => ScalarKind::Decimal,
            "text" | "string" => ScalarKind::String,
            "password" => ScalarKind::Password,
            "char" => ScalarKind::Char,
            "boolean" => ScalarKind::Boolean,
            "date" => ScalarKind::Date,
            "binary" => ScalarKind::Binary,
            "json" => ScalarKind::Json,
            "geo" => ScalarKind::Geo,
            "geometry" => ScalarKind::Geometry,
            _ => return None,
        };
        Some(kind)
    }

    /// Only integer and string scalars have an array mapping.
    fn supports_array(self) -> bool {
        matches!(self, ScalarKind::Int | ScalarKind::String)
    }
}

/// A parsed semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticType {
    Scalar(ScalarKind),
    ScalarArray(ScalarKind),
    Entity(String),
    EntityArray(String),
}

impl SemanticType {
    /// Parses a declared type string such as `string`, `int[]`, `Phone` or `Role[]`.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TypeError::Empty);
        }

        let (base, is_array) = match raw.strip_suffix(ARRAY_MARKER) {
            Some(base) => (base.trim_end(), true),
            None => (raw, false),
        };

        if !is_identifier(base) {
            return Err(TypeError::InvalidSyntax(raw.to_string()));
        }

        match (ScalarKind::from_keyword(base), is_array) {
            (Some(kind), false) => Ok(SemanticType::Scalar(kind)),
            (Some(kind), true) if kind.supports_array() => Ok(SemanticType::ScalarArray(kind)),
            (Some(_), true) => Err(TypeError::UnsupportedArrayType(raw.to_string())),
            (None, false) => Ok(SemanticType::Entity(base.to_string())),
            (None, true) => Ok(SemanticType::EntityArray(base.to_string())),
        }
    }

    /// Name of the referenced entity, for both single and collection references.
    pub fn referenced_entity(&self) -> Option<&str> {
        match self {
            SemanticType::Entity(name) | SemanticType::EntityArray(name) => Some(name),
            _ => None,
        }
    }

    /// Resolves the object type and column type for this semantic type.
    pub fn mapping(&self) -> TypeMapping {
        match self {
            SemanticType::Scalar(kind) => scalar_mapping(*kind),
            SemanticType::ScalarArray(ScalarKind::Int) => TypeMapping {
                object_type: ObjectType::IntegerArray,
                column_type: Some(ColumnType::IntegerArray),
            },
            SemanticType::ScalarArray(_) => TypeMapping {
                object_type: ObjectType::StringArray,
                column_type: Some(ColumnType::VarcharArray),
            },
            SemanticType::Entity(name) => TypeMapping {
                object_type: ObjectType::Entity(name.clone()),
                column_type: Some(ColumnType::BigInt),
            },
            SemanticType::EntityArray(name) => TypeMapping {
                object_type: ObjectType::EntityList(name.clone()),
                column_type: None,
            },
        }
    }
}

fn scalar_mapping(kind: ScalarKind) -> TypeMapping {
    let (object_type, column_type) = match kind {
        ScalarKind::Int => (ObjectType::Integer, ColumnType::Integer),
        ScalarKind::Long => (ObjectType::Long, ColumnType::BigInt),
        ScalarKind::Double => (ObjectType::Double, ColumnType::DoublePrecision),
        ScalarKind::Decimal => (ObjectType::Decimal, ColumnType::Numeric),
        ScalarKind::String => (ObjectType::String, ColumnType::Varchar(None)),
        ScalarKind::Password => (ObjectType::Password, ColumnType::Varchar(None)),
        ScalarKind::Char => (ObjectType::String, ColumnType::Char(1)),
        ScalarKind::Boolean => (ObjectType::Boolean, ColumnType::Boolean),
        ScalarKind::Date => (ObjectType::Date, ColumnType::TimestampTz),
        ScalarKind::Binary => (ObjectType::Bytes, ColumnType::Bytea),
        ScalarKind::Json => (ObjectType::Json, ColumnType::Jsonb),
        ScalarKind::Geo => (
            ObjectType::Geometry,
            ColumnType::Geometry { z: false, srid: Some(DEFAULT_SRID) },
        ),
        ScalarKind::Geometry => (
            ObjectType::Geometry,
            ColumnType::Geometry { z: true, srid: None },
        ),
    };
    TypeMapping { object_type, column_type: Some(column_type) }
}

/// Result of mapping a semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    pub object_type: ObjectType,
    /// `None` for collections, which are stored in a junction table.
    pub column_type: Option<ColumnType>,
}

/// Type of a field in the generated bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObjectType {
    Integer,
    IntegerArray,
    Long,
    Double,
    Decimal,
    String,
    StringArray,
    Password,
    Boolean,
    Date,
    Bytes,
    Json,
    Geometry,
    Entity(String),
    EntityList(String),
}

impl ObjectType {
    /// Rust type used for the struct field, without the surrounding `Option`.
    ///
    /// `geometry` is the simple name of the configured geometry type.
    pub fn rust_type(&self, geometry: &str) -> String {
        match self {
            ObjectType::Integer => "i32".to_string(),
            ObjectType::IntegerArray => "Vec<i32>".to_string(),
            ObjectType::Long => "i64".to_string(),
            ObjectType::Double => "f64".to_string(),
            ObjectType::Decimal => "Decimal".to_string(),
            ObjectType::String | ObjectType::Password => "String".to_string(),
            ObjectType::StringArray => "Vec<String>".to_string(),
            ObjectType::Boolean => "bool".to_string(),
            ObjectType::Date => "DateTime".to_string(),
            ObjectType::Bytes => "Vec<u8>".to_string(),
            ObjectType::Json => "Json".to_string(),
            ObjectType::Geometry => geometry.to_string(),
            ObjectType::Entity(name) => format!("Box<{}>", name),
            ObjectType::EntityList(name) => format!("Vec<{}>", name),
        }
    }

    /// True for types the accessor can return by value.
    pub fn is_copy(&self) -> bool {
        matches!(
            self,
            ObjectType::Integer | ObjectType::Long | ObjectType::Double | ObjectType::Boolean
        )
    }

    /// Name of the `Value` accessor used to read this type from a row or document.
    pub fn value_accessor(&self) -> &'static str {
        match self {
            ObjectType::Integer => "as_i32",
            ObjectType::IntegerArray => "as_i32_vec",
            ObjectType::Long | ObjectType::Entity(_) | ObjectType::EntityList(_) => "as_i64",
            ObjectType::Double => "as_f64",
            ObjectType::Decimal => "as_decimal",
            ObjectType::String | ObjectType::Password => "as_string",
            ObjectType::StringArray => "as_string_vec",
            ObjectType::Boolean => "as_bool",
            ObjectType::Date => "as_date",
            ObjectType::Bytes => "as_bytes",
            ObjectType::Json => "as_json",
            ObjectType::Geometry => "as_geometry",
        }
    }

    /// True if reading the value can fail and the failure should be swallowed.
    pub fn is_best_effort(&self) -> bool {
        matches!(self, ObjectType::Json | ObjectType::Geometry)
    }
}

/// PostgreSQL column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    IntegerArray,
    BigInt,
    DoublePrecision,
    Numeric,
    /// `varchar`, or `VARCHAR(n)` once a length constraint is applied.
    Varchar(Option<u32>),
    VarcharArray,
    Char(u32),
    Boolean,
    TimestampTz,
    Bytea,
    Jsonb,
    Geometry { z: bool, srid: Option<u32> },
}

impl ColumnType {
    /// Applies a `length` constraint. Returns false if the column is not character typed.
    pub fn apply_length(&mut self, length: u32) -> bool {
        match self {
            ColumnType::Varchar(size) => {
                *size = Some(length);
                true
            }
            ColumnType::Char(size) => {
                *size = length;
                true
            }
            _ => false,
        }
    }

    /// Applies a `srid` constraint. Returns false if the column is not a geometry.
    pub fn apply_srid(&mut self, value: u32) -> bool {
        match self {
            ColumnType::Geometry { srid, .. } => {
                *srid = Some(value);
                true
            }
            _ => false,
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, ColumnType::Geometry { .. })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("integer"),
            ColumnType::IntegerArray => f.write_str("integer[]"),
            ColumnType::BigInt => f.write_str("bigint"),
            ColumnType::DoublePrecision => f.write_str("double precision"),
            ColumnType::Numeric => f.write_str("numeric"),
            ColumnType::Varchar(None) => f.write_str("varchar"),
            ColumnType::Varchar(Some(n)) => write!(f, "VARCHAR({})", n),
            ColumnType::VarcharArray => f.write_str("varchar[]"),
            ColumnType::Char(1) => f.write_str("char(1)"),
            ColumnType::Char(n) => write!(f, "CHAR({})", n),
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::TimestampTz => f.write_str("timestamp with time zone"),
            ColumnType::Bytea => f.write_str("bytea"),
            ColumnType::Jsonb => f.write_str("jsonb"),
            ColumnType::Geometry { z, srid } => {
                let kind = if *z { "GeometryZ" } else { "Geometry" };
                match srid {
                    Some(srid) => write!(f, "geometry({},{})", kind, srid),
                    None => write!(f, "geometry({})", kind),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn column(raw: &str) -> String {
        SemanticType::parse(raw)
            .unwrap()
            .mapping()
            .column_type
            .map(|c| c.to_string())
            .unwrap_or_default()
    }

    #[rstest]
    #[case("int", "integer")]
    #[case("int[]", "integer[]")]
    #[case("long", "bigint")]
    #[case("double", "double precision")]
    #[case("float", "double precision")]
    #[case("decimal", "numeric")]
    #[case("numeric", "numeric")]
    #[case("text", "varchar")]
    #[case("string", "varchar")]
    #[case("password", "varchar")]
    #[case("string[]", "varchar[]")]
    #[case("text[]", "varchar[]")]
    #[case("char", "char(1)")]
    #[case("boolean", "boolean")]
    #[case("date", "timestamp with time zone")]
    #[case("binary", "bytea")]
    #[case("json", "jsonb")]
    #[case("geo", "geometry(Geometry,4326)")]
    #[case("geometry", "geometry(GeometryZ)")]
    #[case("Phone", "bigint")]
    #[case("Role[]", "")]
    fn test_column_type_mapping(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(column(raw), expected);
    }

    #[rstest]
    #[case("INT", SemanticType::Scalar(ScalarKind::Int))]
    #[case("String", SemanticType::Scalar(ScalarKind::String))]
    #[case("Boolean", SemanticType::Scalar(ScalarKind::Boolean))]
    #[case("Json", SemanticType::Scalar(ScalarKind::Json))]
    fn test_keywords_are_case_insensitive(#[case] raw: &str, #[case] expected: SemanticType) {
        assert_eq!(SemanticType::parse(raw).unwrap(), expected);
    }

    #[rstest]
    fn test_unknown_keyword_is_entity_reference() {
        assert_eq!(
            SemanticType::parse("Phone").unwrap(),
            SemanticType::Entity("Phone".to_string())
        );
        assert_eq!(
            SemanticType::parse("Role[]").unwrap(),
            SemanticType::EntityArray("Role".to_string())
        );
    }

    #[rstest]
    fn test_object_types() {
        let mapping = SemanticType::parse("Phone").unwrap().mapping();
        assert_eq!(mapping.object_type, ObjectType::Entity("Phone".to_string()));
        assert_eq!(mapping.object_type.rust_type("Geometry"), "Box<Phone>");

        let mapping = SemanticType::parse("Role[]").unwrap().mapping();
        assert_eq!(mapping.object_type.rust_type("Geometry"), "Vec<Role>");
        assert_eq!(mapping.column_type, None);

        let mapping = SemanticType::parse("password").unwrap().mapping();
        assert_eq!(mapping.object_type, ObjectType::Password);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_empty_type_rejected(#[case] raw: &str) {
        assert_eq!(SemanticType::parse(raw), Err(TypeError::Empty));
    }

    #[rstest]
    #[case("Phone Number")]
    #[case("map<string>")]
    #[case("[]")]
    fn test_invalid_syntax_rejected(#[case] raw: &str) {
        assert!(matches!(SemanticType::parse(raw), Err(TypeError::InvalidSyntax(_))));
    }

    #[rstest]
    #[case("date[]")]
    #[case("json[]")]
    #[case("boolean[]")]
    fn test_unsupported_scalar_arrays(#[case] raw: &str) {
        assert!(matches!(
            SemanticType::parse(raw),
            Err(TypeError::UnsupportedArrayType(_))
        ));
    }

    #[rstest]
    fn test_length_rewrites_character_columns() {
        let mut varchar = ColumnType::Varchar(None);
        assert!(varchar.apply_length(128));
        assert_eq!(varchar.to_string(), "VARCHAR(128)");

        let mut ch = ColumnType::Char(1);
        assert!(ch.apply_length(3));
        assert_eq!(ch.to_string(), "CHAR(3)");

        let mut int = ColumnType::Integer;
        assert!(!int.apply_length(3));
        assert_eq!(int.to_string(), "integer");
    }

    #[rstest]
    fn test_srid_rewrites_geometry_and_keeps_z_flag() {
        let mut geo = ColumnType::Geometry { z: false, srid: Some(DEFAULT_SRID) };
        assert!(geo.apply_srid(3857));
        assert_eq!(geo.to_string(), "geometry(Geometry,3857)");

        let mut geometry = ColumnType::Geometry { z: true, srid: None };
        assert!(geometry.apply_srid(3857));
        assert_eq!(geometry.to_string(), "geometry(GeometryZ,3857)");

        let mut text = ColumnType::Varchar(None);
        assert!(!text.apply_srid(3857));
    }
}
