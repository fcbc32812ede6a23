mod cli_tests;
mod execute;
mod execute_tests;
mod output;

use clap::Args;
use std::path::PathBuf;

/// Compile a schema into verified Rust bindings and a DDL script
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  modelc compile schema.json --out src/models          # Write bindings and schema.sql
  modelc compile schema.json --out src/models --seed 7 # Reproducible verification order
  modelc -o json compile schema.json --out gen         # Machine-readable summary")]
pub struct CompileCmd {
    /// Normalized schema JSON file
    pub input: PathBuf,

    /// Directory the artifacts are written to (created if missing)
    #[arg(long)]
    pub out: PathBuf,

    /// Seed for the resolver's reshuffles, overriding the config file
    #[arg(long)]
    pub seed: Option<u64>,
}
