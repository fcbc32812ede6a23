//! Compilation facade.
//!
//! Builds the schema model once, emits the DDL script and the per-entity
//! bindings, and runs the bindings through the compilation-order resolver.
//! Either every artifact is produced or the run fails as a whole.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::emit::source::MODULE_INDEX;
use crate::emit::{GeneratedSource, ObjectSourceEmitter, PostgresDdlCompiler, SourceOptions, Template};
use crate::error::CompilerError;
use crate::resolver::{CompilationOrderResolver, ResolverConfig, Verifier};
use crate::schema::{ModelOptions, NormalizedSchema, SchemaModel};

/// File name of the DDL script.
pub const DDL_FILE: &str = "schema.sql";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub model: ModelOptions,
    pub source: SourceOptions,
    pub resolver: ResolverConfig,
    /// Custom template file; the built-in template otherwise
    pub template: Option<PathBuf>,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifacts {
    /// Entity bindings, in input order
    pub sources: Vec<GeneratedSource>,
    pub module_index: String,
    pub ddl: String,
    pub verification_order: Vec<String>,
    pub failed_attempts: usize,
}

pub struct Compiler {
    options: CompilerOptions,
    template: Template,
}

impl Compiler {
    /// Create a compiler, loading the custom template if one is configured.
    pub fn new(options: CompilerOptions) -> Result<Self, CompilerError> {
        let template = match &options.template {
            Some(path) => Template::from_file(path)?,
            None => Template::default(),
        };
        Ok(Self { options, template })
    }

    pub fn with_template(options: CompilerOptions, template: Template) -> Self {
        Self { options, template }
    }

    pub fn build_model(&self, input: &NormalizedSchema) -> Result<SchemaModel, CompilerError> {
        Ok(SchemaModel::build(input, &self.options.model)?)
    }

    /// DDL script only. No verification is involved.
    pub fn ddl(&self, input: &NormalizedSchema) -> Result<String, CompilerError> {
        let model = self.build_model(input)?;
        Ok(PostgresDdlCompiler::compile(&model))
    }

    /// Unverified binding of a single entity.
    pub fn source(&self, input: &NormalizedSchema, entity: &str) -> Result<GeneratedSource, CompilerError> {
        let model = self.build_model(input)?;
        let target = model
            .entity(entity)
            .ok_or_else(|| CompilerError::UnknownEntity(entity.to_string()))?;
        Ok(self.emitter().emit(&model, target)?)
    }

    /// Full run: DDL, bindings and module index, with every binding verified.
    pub fn compile<V: Verifier>(
        &self,
        input: &NormalizedSchema,
        verifier: &V,
    ) -> Result<Artifacts, CompilerError> {
        let model = self.build_model(input)?;
        let ddl = PostgresDdlCompiler::compile(&model);
        let sources = self.emitter().emit_all(&model)?;

        let resolution = CompilationOrderResolver::new(self.options.resolver.clone())
            .resolve(&model, sources, verifier)?;

        info!(
            entities = resolution.sources.len(),
            failed_attempts = resolution.failed_attempts,
            "compilation finished"
        );

        Ok(Artifacts {
            sources: resolution.sources,
            module_index: ObjectSourceEmitter::module_index(&model),
            ddl,
            verification_order: resolution.verification_order,
            failed_attempts: resolution.failed_attempts,
        })
    }

    fn emitter(&self) -> ObjectSourceEmitter<'_> {
        ObjectSourceEmitter::new(&self.template, &self.options.source)
    }
}

/// Write every artifact into `dir`, creating it if needed.
///
/// Returns the written paths: entity files in input order, then the module
/// index and the DDL script.
pub fn write_artifacts(artifacts: &Artifacts, dir: &Path) -> Result<Vec<PathBuf>, CompilerError> {
    fs::create_dir_all(dir).map_err(|source| CompilerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = artifacts
        .sources
        .iter()
        .map(|source| (source.file_name.as_str(), source.text.as_str()))
        .chain([
            (MODULE_INDEX, artifacts.module_index.as_str()),
            (DDL_FILE, artifacts.ddl.as_str()),
        ]);

    let mut written = Vec::new();
    for (name, contents) in files {
        let path = dir.join(name);
        fs::write(&path, contents).map_err(|source| CompilerError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "artifacts written");
    Ok(written)
}
