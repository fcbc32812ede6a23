//! SQL naming rules for tables and schemas.

/// Table names that collide with SQL reserved words.
const RESERVED_TABLE_NAMES: &[&str] = &["user", "order", "group", "table"];

/// Escapes a table or schema name for use in DDL.
///
/// Names are upper-cased, except reserved words, which are quoted in lower case
/// when the table does not live in an explicit schema.
pub fn escape_table_name(name: &str, has_schema: bool) -> String {
    let lower = name.to_lowercase();
    if !has_schema && RESERVED_TABLE_NAMES.contains(&lower.as_str()) {
        format!("\"{}\"", lower)
    } else {
        name.to_uppercase()
    }
}

/// Escapes a table name and prefixes it with its schema, if any.
pub fn qualify_table_name(name: &str, schema: Option<&str>) -> String {
    let table = escape_table_name(name, schema.is_some());
    match schema {
        Some(schema) => format!("{}.{}", escape_table_name(schema, true), table),
        None => table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("contact", false, "CONTACT")]
    #[case("user", false, "\"user\"")]
    #[case("User", false, "\"user\"")]
    #[case("user", true, "USER")]
    #[case("user_role", false, "USER_ROLE")]
    fn test_escape_table_name(#[case] name: &str, #[case] has_schema: bool, #[case] expected: &str) {
        assert_eq!(escape_table_name(name, has_schema), expected);
    }

    #[rstest]
    fn test_qualify_table_name() {
        assert_eq!(qualify_table_name("contact", None), "CONTACT");
        assert_eq!(qualify_table_name("contact", Some("app")), "APP.CONTACT");
        assert_eq!(qualify_table_name("user", Some("app")), "APP.USER");
        assert_eq!(qualify_table_name("user", None), "\"user\"");
    }
}
