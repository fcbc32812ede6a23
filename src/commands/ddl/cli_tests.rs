//! CLI parsing tests for ddl command using the test DSL.

#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use clap::Parser;
    use rstest::rstest;
    use std::path::PathBuf;

    crate::cli_required_arg_test! {
        command: "ddl",
        test_name: test_requires_input,
        required_arg: "<INPUT>",
    }

    crate::cli_option_test! {
        command: "ddl",
        variant: Ddl,
        test_name: test_with_input,
        args: ["schema.json"],
        field: input,
        expected: PathBuf::from("schema.json"),
    }
}
