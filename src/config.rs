//! Configuration file handling.
//!
//! This module loads `.modelc.json` from the current directory, or a file
//! given with `--config`. Without a file every option has its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compiler::CompilerOptions;
use crate::emit::source::DEFAULT_RUNTIME;
use crate::emit::SourceOptions;
use crate::resolver::{CommandVerifier, ResolverConfig, StructuralVerifier, VerifierKind};
use crate::schema::ModelOptions;

/// Config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".modelc.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Module path the generated code imports its runtime API from
    pub runtime: String,
    /// Emit `to_document` on every entity
    pub serialize: bool,
    /// Custom entity template
    pub template: Option<PathBuf>,
    pub allow_undeclared_references: bool,
    pub resolver: ResolverConfig,
    pub verifier: VerifierConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            serialize: true,
            template: None,
            allow_undeclared_references: false,
            resolver: ResolverConfig::default(),
            verifier: VerifierConfig::default(),
        }
    }
}

/// Verifier used by `compile`.
///
/// JSON format uses a "type" field with lowercase variant names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VerifierConfig {
    /// In-process structural check
    Structural {
        #[serde(default)]
        require_context_references: bool,
    },
    /// External program reading the sources from stdin
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::Structural {
            require_context_references: false,
        }
    }
}

impl VerifierConfig {
    pub fn to_verifier(&self) -> VerifierKind {
        match self {
            Self::Structural {
                require_context_references,
            } => StructuralVerifier::new(*require_context_references).into(),
            Self::Command { program, args } => CommandVerifier::new(program, args.clone()).into(),
        }
    }
}

impl ConfigFile {
    /// Load the explicit config file, or `.modelc.json` if present, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit config file doesn't exist
    /// - The file cannot be read
    /// - The JSON is invalid
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => Self::from_path(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_path(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            model: ModelOptions {
                allow_undeclared_references: self.allow_undeclared_references,
            },
            source: SourceOptions {
                runtime: self.runtime.clone(),
                serialize: self.serialize,
            },
            resolver: self.resolver.clone(),
            template: self.template.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::OrderStrategy;
    use crate::test_utils::create_temp_json_file;
    use rstest::rstest;
    use std::sync::{Mutex, OnceLock};

    fn test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[rstest]
    fn test_empty_object_uses_defaults() {
        let config: ConfigFile = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.compiler_options(), CompilerOptions::default());
    }

    #[rstest]
    fn test_full_deserialization() {
        let json = r#"
        {
            "runtime": "my_app::db",
            "serialize": false,
            "template": "templates/custom.tpl",
            "allow_undeclared_references": true,
            "resolver": { "strategy": "shuffle", "seed": 7 },
            "verifier": { "type": "command", "program": "rustfmt", "args": ["--check"] }
        }
        "#;
        let config: ConfigFile = serde_json::from_str(json).unwrap();
        let options = config.compiler_options();

        assert_eq!(options.source.runtime, "my_app::db");
        assert!(!options.source.serialize);
        assert_eq!(options.template, Some(PathBuf::from("templates/custom.tpl")));
        assert!(options.model.allow_undeclared_references);
        assert_eq!(options.resolver.strategy, OrderStrategy::Shuffle);
        assert_eq!(options.resolver.seed, Some(7));
        assert_eq!(
            config.verifier.to_verifier(),
            VerifierKind::CommandVerifier(CommandVerifier::new("rustfmt", vec!["--check".to_string()]))
        );
    }

    #[rstest]
    #[case(r#"{"type": "structural"}"#, false)]
    #[case(r#"{"type": "structural", "require_context_references": true}"#, true)]
    fn test_structural_verifier(#[case] json: &str, #[case] require: bool) {
        let config: VerifierConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.to_verifier(), VerifierKind::StructuralVerifier(StructuralVerifier::new(require)));
    }

    #[rstest]
    fn test_unknown_verifier_type() {
        let result: Result<VerifierConfig, _> = serde_json::from_str(r#"{"type": "rustc"}"#);
        assert!(result.is_err());
    }

    #[rstest]
    fn test_load_explicit_file() {
        let file = create_temp_json_file(r#"{"serialize": false}"#);
        let config = ConfigFile::load(Some(file.path())).unwrap();
        assert!(!config.serialize);
    }

    #[rstest]
    fn test_load_missing_explicit_file() {
        let result = ConfigFile::load(Some(Path::new("/nonexistent/.modelc.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[rstest]
    fn test_load_invalid_json() {
        let file = create_temp_json_file("{ invalid json }");
        let result = ConfigFile::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[rstest]
    fn test_load_defaults_without_file() {
        let _lock = test_lock().lock();
        let temp_dir = tempfile::tempdir().unwrap();
        let old_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = ConfigFile::load(None);

        std::env::set_current_dir(old_dir).unwrap();
        assert_eq!(result.unwrap(), ConfigFile::default());
    }

    #[rstest]
    fn test_load_file_from_current_dir() {
        let _lock = test_lock().lock();
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"runtime": "crate::store"}"#,
        )
        .unwrap();
        let old_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = ConfigFile::load(None);

        std::env::set_current_dir(old_dir).unwrap();
        assert_eq!(result.unwrap().runtime, "crate::store");
    }
}
