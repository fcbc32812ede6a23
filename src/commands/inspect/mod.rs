mod cli_tests;
mod execute;
mod output;

use clap::Args;
use std::path::PathBuf;

/// Show the resolved entity model: columns, foreign keys and junction tables
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  modelc inspect schema.json                 # Every entity
  modelc inspect schema.json --entity User   # One entity
  modelc -o toon inspect schema.json         # Compact machine-readable form")]
pub struct InspectCmd {
    /// Normalized schema JSON file
    pub input: PathBuf,

    /// Only show this entity
    #[arg(short, long)]
    pub entity: Option<String>,
}
