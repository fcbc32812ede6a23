mod execute;
mod output;

use clap::Args;
use std::path::PathBuf;

/// Print the generated Rust binding of one entity
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  modelc source schema.json --entity Contact   # Print contact.rs
  modelc source schema.json -e User -o json    # With file and module names")]
pub struct SourceCmd {
    /// Normalized schema JSON file
    pub input: PathBuf,

    /// Entity name as declared in the schema
    #[arg(short, long)]
    pub entity: String,
}
