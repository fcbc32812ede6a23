//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `Execute` implementation returning a command-specific result
//! - An `Outputable` implementation formatting that result

mod compile;
mod ddl;
mod inspect;
mod source;

pub use compile::CompileCmd;
pub use ddl::DdlCmd;
pub use inspect::InspectCmd;
pub use source::SourceCmd;

use clap::Subcommand;
use std::error::Error;
use std::path::Path;

use crate::config::ConfigFile;
use crate::output::{OutputFormat, Outputable};
use crate::schema::NormalizedSchema;

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a schema into verified Rust bindings and a DDL script
    Compile(CompileCmd),

    /// Print the PostgreSQL DDL script of a schema
    Ddl(DdlCmd),

    /// Print the generated Rust binding of one entity
    Source(SourceCmd),

    /// Show the resolved entity model: columns, foreign keys and junction tables
    Inspect(InspectCmd),

    /// Catch-all for unknown commands
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Command {
    /// Execute the command and return formatted output
    pub fn run(self, config: &ConfigFile, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Compile(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Ddl(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Source(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Inspect(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().unwrap_or(&String::new())).into())
            }
        }
    }
}

/// Read the schema file a command was given.
pub(crate) fn read_schema(path: &Path) -> Result<NormalizedSchema, Box<dyn Error>> {
    Ok(NormalizedSchema::from_path(path)?)
}
