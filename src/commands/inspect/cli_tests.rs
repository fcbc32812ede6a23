//! CLI parsing tests for inspect command using the test DSL.

#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use clap::Parser;
    use rstest::rstest;
    use std::path::PathBuf;

    crate::cli_required_arg_test! {
        command: "inspect",
        test_name: test_requires_input,
        required_arg: "<INPUT>",
    }

    crate::cli_option_test! {
        command: "inspect",
        variant: Inspect,
        test_name: test_with_input,
        args: ["schema.json"],
        field: input,
        expected: PathBuf::from("schema.json"),
    }

    crate::cli_option_test! {
        command: "inspect",
        variant: Inspect,
        test_name: test_with_entity,
        args: ["schema.json", "--entity", "User"],
        field: entity,
        expected: Some("User".to_string()),
    }

    crate::cli_defaults_test! {
        command: "inspect",
        variant: Inspect,
        required_args: ["schema.json"],
        defaults: {
            entity: None,
        },
    }
}
