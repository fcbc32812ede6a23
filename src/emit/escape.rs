//! String escaping for generated SQL and Rust source.

/// Escape a string for use inside a double-quoted Rust string literal.
pub fn escape_rust_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{{{:x}}}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

/// Wrap a string in double quotes as a Rust string literal.
#[inline]
pub fn rust_string_literal(s: &str) -> String {
    format!("\"{}\"", escape_rust_string(s))
}

/// Quote a string as a SQL literal. Embedded single quotes are doubled.
#[inline]
pub fn sql_string_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hello", "hello")]
    #[case(r#"say "hello""#, r#"say \"hello\""#)]
    #[case(r"path\to\file", r"path\\to\\file")]
    #[case("line\nbreak", r"line\nbreak")]
    #[case("\u{1}", r"\u{1}")]
    fn test_escape_rust_string(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_rust_string(input), expected);
    }

    #[rstest]
    fn test_rust_string_literal_quotes_reserved_table() {
        assert_eq!(rust_string_literal("\"user\""), r#""\"user\"""#);
    }

    #[rstest]
    #[case("active", "'active'")]
    #[case("O'Brien", "'O''Brien'")]
    #[case("''", "''''''")]
    fn test_sql_string_literal(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sql_string_literal(input), expected);
    }
}
