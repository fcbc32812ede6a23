//! Declarative macros for command tests.
//!
//! CLI tests declare the arguments and the expected field values; output tests
//! declare a fixture and what its formatted form must contain. The macros
//! expand into `#[rstest]` functions, so the calling module needs `rstest` in
//! scope, plus `clap::Parser` and `crate::cli::Args` for the CLI macros.

/// Parse `modelc <command> <args..>` and return the inner command struct.
///
/// Panics if parsing fails or produces a different command.
#[macro_export]
macro_rules! parse_command {
    ($variant:ident, [$($arg:expr),* $(,)?]) => {
        match Args::try_parse_from(["modelc", $($arg),*]) {
            Ok(Args { command: crate::commands::Command::$variant(cmd), .. }) => cmd,
            Ok(other) => panic!("Expected {} command, got {:?}", stringify!($variant), other.command),
            Err(e) => panic!("Failed to parse arguments: {}", e),
        }
    };
}

/// Check the fields a command gets when only its required args are given.
#[macro_export]
macro_rules! cli_defaults_test {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        required_args: [$($req_arg:literal),*],
        defaults: {
            $($field:ident : $expected:expr),* $(,)?
        } $(,)?
    ) => {
        #[rstest]
        fn test_defaults() {
            let cmd = $crate::parse_command!($variant, [$cmd, $($req_arg),*]);
            $(
                assert_eq!(cmd.$field, $expected,
                    concat!("Default value mismatch for field: ", stringify!($field)));
            )*
        }
    };
}

/// Check that one option lands in the expected field.
///
/// `required_args` are prepended to `args` when given.
#[macro_export]
macro_rules! cli_option_test {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        $(required_args: [$($req_arg:literal),+],)?
        test_name: $test_name:ident,
        args: [$($arg:literal),+],
        field: $field:ident,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let cmd = $crate::parse_command!($variant, [$cmd, $($($req_arg,)+)? $($arg),+]);
            assert_eq!(cmd.$field, $expected,
                concat!("Field ", stringify!($field), " mismatch"));
        }
    };
}

/// Check that a command without arguments fails and names the missing one.
///
/// # Example
///
/// ```ignore
/// cli_required_arg_test! {
///     command: "ddl",
///     test_name: test_requires_input,
///     required_arg: "<INPUT>",
/// }
/// ```
#[macro_export]
macro_rules! cli_required_arg_test {
    (
        command: $cmd:literal,
        test_name: $test_name:ident,
        required_arg: $arg:literal $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let err = Args::try_parse_from(["modelc", $cmd])
                .expect_err(concat!("Command should require ", $arg));
            assert!(err.to_string().contains($arg), concat!("Error should mention ", $arg));
        }
    };
}

/// Check that parsing rejects the given arguments.
#[macro_export]
macro_rules! cli_error_test {
    (
        command: $cmd:literal,
        test_name: $test_name:ident,
        args: [$($arg:literal),+] $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            assert!(Args::try_parse_from(["modelc", $cmd, $($arg),+]).is_err());
        }
    };
}

/// Compare the table form of a fixture with an expected string.
#[macro_export]
macro_rules! output_table_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::Outputable;
            assert_eq!($fixture.to_table(), $expected);
        }
    };
}

/// Check that a formatted fixture contains every needle.
///
/// # Example
/// ```ignore
/// output_contains_test! {
///     test_name: test_format_toon,
///     fixture: single_result,
///     fixture_type: InspectResult,
///     format: Toon,
///     contains: ["package", "USER_ROLE"],
/// }
/// ```
#[macro_export]
macro_rules! output_contains_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        format: $format:ident,
        contains: [$($needle:literal),* $(,)?] $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::{OutputFormat, Outputable};
            let output = $fixture.format(OutputFormat::$format);
            $(
                assert!(output.contains($needle),
                    concat!(stringify!($format), " output should contain: ", $needle));
            )*
        }
    };
}

/// Parse the JSON form of a fixture and compare top-level fields.
#[macro_export]
macro_rules! output_json_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        assertions: { $($field:literal : $expected:expr),* $(,)? } $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::{OutputFormat, Outputable};
            let output = $fixture.format(OutputFormat::Json);
            let parsed: serde_json::Value = serde_json::from_str(&output)
                .expect("Should produce valid JSON");
            $(
                assert_eq!(parsed[$field], $expected, concat!("JSON field mismatch: ", $field));
            )*
        }
    };
}
