mod cli_tests;
mod execute;
mod output;

use clap::Args;
use std::path::PathBuf;

/// Print the PostgreSQL DDL script of a schema
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  modelc ddl schema.json              # Print the script
  modelc ddl schema.json > schema.sql # Save it")]
pub struct DdlCmd {
    /// Normalized schema JSON file
    pub input: PathBuf,
}
