//! Execute tests for compile command.

#[cfg(test)]
mod tests {
    use super::super::CompileCmd;
    use crate::commands::Execute;
    use crate::config::{ConfigFile, VerifierConfig};
    use crate::fixtures;
    use crate::test_utils::create_temp_json_file;
    use rstest::{fixture, rstest};
    use std::fs;

    #[fixture]
    fn contacts_file() -> tempfile::NamedTempFile {
        create_temp_json_file(fixtures::CONTACTS)
    }

    #[rstest]
    fn test_compile_writes_artifacts(contacts_file: tempfile::NamedTempFile) {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("models");
        let cmd = CompileCmd {
            input: contacts_file.path().to_path_buf(),
            out: out.clone(),
            seed: Some(1),
        };

        let result = cmd.execute(&ConfigFile::default()).unwrap();

        assert_eq!(result.package, "crate::models");
        assert_eq!(result.files.len(), 6);
        assert_eq!(result.failed_attempts, 0);
        assert_eq!(result.verification_order.len(), 4);
        for file in ["phone.rs", "contact.rs", "user.rs", "role.rs", "mod.rs", "schema.sql"] {
            assert!(out.join(file).exists(), "missing {}", file);
        }
        let ddl = fs::read_to_string(out.join("schema.sql")).unwrap();
        assert!(ddl.contains("CREATE TABLE USER_ROLE ("));
    }

    #[rstest]
    fn test_compile_cycle_with_strict_verifier_fails() {
        let input = create_temp_json_file(fixtures::CYCLE);
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile {
            verifier: VerifierConfig::Structural {
                require_context_references: true,
            },
            ..ConfigFile::default()
        };
        let cmd = CompileCmd {
            input: input.path().to_path_buf(),
            out: dir.path().join("models"),
            seed: Some(3),
        };

        let result = cmd.execute(&config);

        assert!(result.is_err());
        assert!(!dir.path().join("models").exists());
    }

    #[rstest]
    fn test_compile_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = CompileCmd {
            input: dir.path().join("missing.json"),
            out: dir.path().join("models"),
            seed: None,
        };
        assert!(cmd.execute(&ConfigFile::default()).is_err());
    }

    #[rstest]
    fn test_compile_summary_table(contacts_file: tempfile::NamedTempFile) {
        use crate::output::Outputable;

        let dir = tempfile::tempdir().unwrap();
        let cmd = CompileCmd {
            input: contacts_file.path().to_path_buf(),
            out: dir.path().to_path_buf(),
            seed: None,
        };
        let table = cmd.execute(&ConfigFile::default()).unwrap().to_table();

        assert!(table.starts_with("Compiled crate::models: 4 entities into "));
        assert!(table.contains("Verification order (0 failed attempt(s)):"));
        assert!(table.contains("Wrote 6 file(s):"));
    }
}
