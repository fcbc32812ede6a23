//! Structural template for generated entity source.
//!
//! A template is plain text with `${name}` placeholders. Rendering substitutes
//! every placeholder and fails if any of them has no value.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Template compiled into the binary.
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/entity.rs.tpl");

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template placeholder '{placeholder}' has no value")]
    Unresolved { placeholder: String },

    #[error("Failed to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Values substituted into a template, keyed by placeholder name.
pub type Bindings = HashMap<&'static str, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Template {
    pub fn new(text: &str) -> Self {
        Self { text: text.to_string() }
    }

    /// Load a custom template from disk.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { text })
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER_REGEX.captures_iter(&self.text) {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Substitute every placeholder. Values that no placeholder uses are ignored.
    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut unresolved: Option<String> = None;
        let rendered = PLACEHOLDER_REGEX.replace_all(&self.text, |caps: &Captures| {
            let name = &caps[1];
            match bindings.get(name) {
                Some(value) => value.clone(),
                None => {
                    unresolved.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });

        match unresolved {
            Some(placeholder) => Err(TemplateError::Unresolved { placeholder }),
            None => Ok(rendered.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_render_substitutes_all_placeholders() {
        let template = Template::new("struct ${entity} { ${fields} } // ${entity}");
        let mut bindings = Bindings::new();
        bindings.insert("entity", "Contact".to_string());
        bindings.insert("fields", "name: String".to_string());
        bindings.insert("unused", "ignored".to_string());

        assert_eq!(
            template.render(&bindings).unwrap(),
            "struct Contact { name: String } // Contact"
        );
    }

    #[rstest]
    fn test_render_fails_on_missing_value() {
        let template = Template::new("${entity} ${missing}");
        let mut bindings = Bindings::new();
        bindings.insert("entity", "Contact".to_string());

        let Err(TemplateError::Unresolved { placeholder }) = template.render(&bindings) else {
            panic!("Expected unresolved placeholder");
        };
        assert_eq!(placeholder, "missing");
    }

    #[rstest]
    fn test_dollar_without_braces_is_literal() {
        let template = Template::new("conn.query(\"... = $1\") ${x}");
        let mut bindings = Bindings::new();
        bindings.insert("x", "ok".to_string());
        assert_eq!(template.render(&bindings).unwrap(), "conn.query(\"... = $1\") ok");
    }

    #[rstest]
    fn test_placeholders_in_first_appearance_order() {
        let template = Template::new("${b} ${a} ${b}");
        assert_eq!(template.placeholders(), vec!["b", "a"]);
    }

    #[rstest]
    fn test_default_template_placeholders() {
        let template = Template::default();
        let placeholders = template.placeholders();
        for name in ["entity", "imports", "fields", "row_reads", "save_body", "to_document"] {
            assert!(placeholders.contains(&name), "missing {name}");
        }
    }

    #[rstest]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"pub struct ${entity};").unwrap();
        let template = Template::from_file(file.path()).unwrap();
        assert_eq!(template.placeholders(), vec!["entity"]);
    }

    #[rstest]
    fn test_from_missing_file() {
        let result = Template::from_file(Path::new("/nonexistent/entity.tpl"));
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }
}
