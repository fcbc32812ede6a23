//! Crate-level error.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::emit::TemplateError;
use crate::resolver::ResolveError;
use crate::schema::{InputError, ModelError};

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Entity '{0}' is not declared in the schema")]
    UnknownEntity(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
