use std::error::Error;

use serde::Serialize;

use super::CompileCmd;
use crate::commands::{read_schema, Execute};
use crate::compiler::{write_artifacts, Compiler};
use crate::config::ConfigFile;

/// Result of the compile command execution
#[derive(Debug, Default, Serialize)]
pub struct CompileResult {
    pub package: String,
    pub out_dir: String,
    /// Written files, entity bindings first
    pub files: Vec<String>,
    pub verification_order: Vec<String>,
    pub failed_attempts: usize,
}

impl Execute for CompileCmd {
    type Output = CompileResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let input = read_schema(&self.input)?;

        let mut options = config.compiler_options();
        if self.seed.is_some() {
            options.resolver.seed = self.seed;
        }
        let compiler = Compiler::new(options)?;
        let verifier = config.verifier.to_verifier();

        let artifacts = compiler.compile(&input, &verifier)?;
        let written = write_artifacts(&artifacts, &self.out)?;

        Ok(CompileResult {
            package: input.package.clone(),
            out_dir: self.out.display().to_string(),
            files: written.iter().map(|p| p.display().to_string()).collect(),
            verification_order: artifacts.verification_order,
            failed_attempts: artifacts.failed_attempts,
        })
    }
}
