//! Naming helpers shared by the schema model and both emitters.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a plain identifier: a letter or underscore followed by word characters.
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Rust keywords that can be used as raw identifiers (`r#type`).
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "union", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be escaped with `r#` and are therefore unusable as field names.
const FORBIDDEN_IDENTIFIERS: &[&str] = &["self", "Self", "super", "crate"];

/// Converts a mixed-case identifier into lower-case underscore form.
///
/// Acronyms are kept together, so `userID` becomes `user_id` and
/// `HTMLParser` becomes `html_parser`.
///
/// # Examples
///
/// ```
/// use modelc::utils::camel_case_to_underscore;
/// assert_eq!(camel_case_to_underscore("postalCode"), "postal_code");
/// assert_eq!(camel_case_to_underscore("userID"), "user_id");
/// ```
pub fn camel_case_to_underscore(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len() + 4);
    let mut last_uppercase = false;

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                let acronym_continues = last_uppercase
                    && chars.get(i + 1).is_none_or(|next| next.is_uppercase());
                if !acronym_continues {
                    result.push('_');
                }
            }
            result.push(ch);
            last_uppercase = true;
        } else {
            result.push(ch);
            last_uppercase = false;
        }
    }

    result.to_lowercase()
}

/// Returns true if `s` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER_REGEX.is_match(s)
}

/// Returns true if `name` can never be used as a Rust field or method name.
pub fn is_forbidden_identifier(name: &str) -> bool {
    FORBIDDEN_IDENTIFIERS.contains(&name)
}

/// Escapes a snake_case name for use as a Rust identifier.
///
/// Keywords are emitted as raw identifiers, everything else is returned as is.
pub fn rust_identifier(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}
