use std::error::Error;

use serde::Serialize;

use super::DdlCmd;
use crate::commands::{read_schema, Execute};
use crate::compiler::Compiler;
use crate::config::ConfigFile;

/// Result of the ddl command execution
#[derive(Debug, Default, Serialize)]
pub struct DdlResult {
    pub entities: usize,
    pub script: String,
}

impl Execute for DdlCmd {
    type Output = DdlResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let input = read_schema(&self.input)?;
        let compiler = Compiler::new(config.compiler_options())?;

        Ok(DdlResult {
            entities: input.models.len(),
            script: compiler.ddl(&input)?,
        })
    }
}
