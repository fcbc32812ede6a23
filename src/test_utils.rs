//! Shared test utilities for command and compiler tests.

use std::io::Write;

use tempfile::NamedTempFile;

use crate::schema::NormalizedSchema;

/// Create a temporary file containing the given content.
///
/// Used to hand schema and config files to commands.
pub fn create_temp_json_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

/// Parse a fixture into a normalized schema.
pub fn parse_schema(json: &str) -> NormalizedSchema {
    NormalizedSchema::from_json_str(json).expect("Fixture should parse")
}
