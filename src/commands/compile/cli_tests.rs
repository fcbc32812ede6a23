//! CLI parsing tests for compile command using the test DSL.

#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use clap::Parser;
    use rstest::rstest;
    use std::path::PathBuf;

    crate::cli_required_arg_test! {
        command: "compile",
        test_name: test_requires_input,
        required_arg: "<INPUT>",
    }

    crate::cli_error_test! {
        command: "compile",
        test_name: test_requires_out,
        args: ["schema.json"],
    }

    crate::cli_option_test! {
        command: "compile",
        variant: Compile,
        test_name: test_with_input,
        args: ["schema.json", "--out", "gen"],
        field: input,
        expected: PathBuf::from("schema.json"),
    }

    crate::cli_option_test! {
        command: "compile",
        variant: Compile,
        test_name: test_with_out,
        args: ["schema.json", "--out", "src/models"],
        field: out,
        expected: PathBuf::from("src/models"),
    }

    crate::cli_option_test! {
        command: "compile",
        variant: Compile,
        required_args: ["schema.json", "--out", "gen"],
        test_name: test_with_seed,
        args: ["--seed", "42"],
        field: seed,
        expected: Some(42),
    }

    crate::cli_defaults_test! {
        command: "compile",
        variant: Compile,
        required_args: ["schema.json", "--out", "gen"],
        defaults: {
            seed: None,
        },
    }

    crate::cli_error_test! {
        command: "compile",
        test_name: test_negative_seed_rejected,
        args: ["schema.json", "--out", "gen", "--seed", "-1"],
    }
}
