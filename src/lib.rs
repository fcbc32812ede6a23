//! modelc library - entity schema compiler
//!
//! Compiles a JSON entity schema into Rust bindings (one module per entity)
//! and a PostgreSQL DDL script, verifying the bindings in an order that
//! satisfies their references to each other.

pub mod cli;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod output;
pub mod resolver;
pub mod schema;
pub mod utils;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod fixtures;

#[cfg(test)]
pub mod test_utils;

pub use compiler::{write_artifacts, Artifacts, Compiler, CompilerOptions};
pub use error::CompilerError;
