use std::error::Error;

use super::SourceCmd;
use crate::commands::{read_schema, Execute};
use crate::compiler::Compiler;
use crate::config::ConfigFile;
use crate::emit::GeneratedSource;

impl Execute for SourceCmd {
    type Output = GeneratedSource;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let input = read_schema(&self.input)?;
        let compiler = Compiler::new(config.compiler_options())?;
        Ok(compiler.source(&input, &self.entity)?)
    }
}
