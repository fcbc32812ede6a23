//! Source verifiers.
//!
//! A verifier decides whether one entity's generated source is acceptable
//! given the sources already accepted. The resolver only counts failures, so
//! the error carries nothing but a message for the logs.

use std::collections::HashSet;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use enum_dispatch::enum_dispatch;
use regex::Regex;
use thiserror::Error;

use crate::emit::GeneratedSource;

static SUPER_IMPORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"use\s+super::(?:\{([^}]*)\}|(\w+))\s*;").unwrap());

static STRUCT_DECLARATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pub\s+struct\s+(\w+)\b").unwrap());

/// Longest char literal: `'\u{10FFFF}'`.
const MAX_CHAR_LITERAL_LEN: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct VerifyError {
    pub message: String,
}

impl VerifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[enum_dispatch]
pub trait Verifier {
    /// Accept or reject `candidate`, given the sources verified before it.
    fn verify(
        &self,
        candidate: &GeneratedSource,
        context: &[&GeneratedSource],
    ) -> Result<(), VerifyError>;
}

/// Built-in verifiers.
#[enum_dispatch(Verifier)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierKind {
    StructuralVerifier,
    CommandVerifier,
}

impl Default for VerifierKind {
    fn default() -> Self {
        StructuralVerifier::default().into()
    }
}

/// In-process check of the generated text.
///
/// Delimiters must balance (ignoring strings, chars and comments) and the
/// source must declare its entity's struct. With `require_context_references`
/// every type imported from `super` must already be in the context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralVerifier {
    pub require_context_references: bool,
}

impl StructuralVerifier {
    pub fn new(require_context_references: bool) -> Self {
        Self { require_context_references }
    }
}

impl Verifier for StructuralVerifier {
    fn verify(
        &self,
        candidate: &GeneratedSource,
        context: &[&GeneratedSource],
    ) -> Result<(), VerifyError> {
        check_delimiters(&candidate.text)?;

        let declared = STRUCT_DECLARATION_REGEX
            .captures_iter(&candidate.text)
            .any(|caps| &caps[1] == candidate.entity);
        if !declared {
            return Err(VerifyError::new(format!(
                "{} does not declare `pub struct {}`",
                candidate.file_name, candidate.entity
            )));
        }

        if self.require_context_references {
            let known: HashSet<&str> = context
                .iter()
                .map(|source| source.entity.as_str())
                .chain(std::iter::once(candidate.entity.as_str()))
                .collect();
            if let Some(missing) = super_imports(&candidate.text)
                .into_iter()
                .find(|name| !known.contains(name))
            {
                return Err(VerifyError::new(format!(
                    "{} imports `{}` before it is available",
                    candidate.file_name, missing
                )));
            }
        }
        Ok(())
    }
}

/// Types imported through `use super::...`.
fn super_imports(text: &str) -> Vec<&str> {
    SUPER_IMPORT_REGEX
        .captures_iter(text)
        .flat_map(|caps| {
            let list = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
            list.split(',').map(str::trim).filter(|name| !name.is_empty())
        })
        .collect()
}

/// Checks `()`, `[]` and `{}` nesting outside strings, chars and comments.
fn check_delimiters(text: &str) -> Result<(), VerifyError> {
    let chars: Vec<char> = text.chars().collect();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => line += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(VerifyError::new(format!("unterminated comment at line {}", line)));
                }
                i += 2;
                continue;
            }
            'r' if is_raw_string_start(&chars, i) => {
                let hashes = chars[i + 1..].iter().take_while(|&&h| h == '#').count();
                i += 2 + hashes;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(VerifyError::new(format!(
                                "unterminated raw string at line {}",
                                line
                            )));
                        }
                        Some('"') if chars[i + 1..].iter().take(hashes).filter(|&&h| h == '#').count() == hashes => {
                            i += 1 + hashes;
                            break;
                        }
                        Some('\n') => line += 1,
                        Some(_) => {}
                    }
                    i += 1;
                }
                continue;
            }
            '"' => {
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(VerifyError::new(format!(
                                "unterminated string at line {}",
                                line
                            )));
                        }
                        Some('\\') => i += 1,
                        Some('"') => break,
                        Some('\n') => line += 1,
                        Some(_) => {}
                    }
                    i += 1;
                }
            }
            '\'' => {
                if let Some(len) = char_literal_len(&chars, i) {
                    i += len - 1;
                }
            }
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, opened)) => {
                        return Err(VerifyError::new(format!(
                            "'{}' at line {} closes '{}' from line {}",
                            c, line, open, opened
                        )));
                    }
                    None => {
                        return Err(VerifyError::new(format!("unmatched '{}' at line {}", c, line)));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    match stack.pop() {
        Some((open, opened)) => Err(VerifyError::new(format!(
            "'{}' from line {} is never closed",
            open, opened
        ))),
        None => Ok(()),
    }
}

/// Length of the char literal opening at `i`, or `None` for a lifetime.
///
/// A quote opens a literal only if its closing quote follows: right after one
/// character, or after an escape no longer than `\u{10FFFF}`.
fn char_literal_len(chars: &[char], i: usize) -> Option<usize> {
    match chars.get(i + 1)? {
        '\\' => (i + 3..(i + MAX_CHAR_LITERAL_LEN).min(chars.len()))
            .find(|&j| chars[j] == '\'')
            .map(|j| j - i + 1),
        '\'' | '\n' => None,
        _ => (chars.get(i + 2) == Some(&'\'')).then_some(3),
    }
}

/// `r"` or `r#"` not preceded by an identifier character.
fn is_raw_string_start(chars: &[char], i: usize) -> bool {
    if i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_') {
        return false;
    }
    let hashes = chars[i + 1..].iter().take_while(|&&h| h == '#').count();
    chars.get(i + 1 + hashes) == Some(&'"')
}

/// Pipes the context sources and then the candidate into an external
/// program. Exit status 0 means the candidate is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVerifier {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandVerifier {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self { program: program.to_string(), args }
    }
}

impl Verifier for CommandVerifier {
    fn verify(
        &self,
        candidate: &GeneratedSource,
        context: &[&GeneratedSource],
    ) -> Result<(), VerifyError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VerifyError::new(format!("failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            for source in context.iter().copied().chain(std::iter::once(candidate)) {
                // The program may exit before reading everything; its status decides.
                if stdin.write_all(source.text.as_bytes()).is_err() {
                    break;
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| VerifyError::new(format!("failed to wait for {}: {}", self.program, e)))?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(VerifyError::new(format!(
                "{} rejected {} ({}): {}",
                self.program,
                candidate.file_name,
                output.status,
                stderr.trim()
            )))
        }
    }
}
