//! Artifact emitters.
//!
//! Both emitters consume the same [`SchemaModel`](crate::schema::SchemaModel):
//! [`ddl`] produces the PostgreSQL script, [`source`] the Rust bindings.

pub mod ddl;
pub mod escape;
pub mod source;
pub mod template;

pub use ddl::PostgresDdlCompiler;
pub use source::{GeneratedSource, ObjectSourceEmitter, SourceOptions};
pub use template::{Template, TemplateError};
