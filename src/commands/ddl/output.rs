//! Output formatting for ddl command results.

use super::execute::DdlResult;
use crate::output::Outputable;

impl Outputable for DdlResult {
    fn to_table(&self) -> String {
        if self.script.is_empty() {
            return "-- No entities declared.".to_string();
        }
        self.script.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use rstest::rstest;

    #[rstest]
    fn test_empty_script() {
        let result = DdlResult::default();
        assert_eq!(result.to_table(), "-- No entities declared.");
    }

    #[rstest]
    fn test_script_printed_verbatim() {
        let result = DdlResult {
            entities: 1,
            script: "CREATE TABLE PHONE (\n    ID BIGSERIAL NOT NULL\n);\n".to_string(),
        };
        assert_eq!(result.to_table(), "CREATE TABLE PHONE (\n    ID BIGSERIAL NOT NULL\n);");
        let json: serde_json::Value = serde_json::from_str(&result.format(OutputFormat::Json)).unwrap();
        assert_eq!(json["entities"], 1);
    }
}
