//! Output formatting for compile command results.

use super::execute::CompileResult;
use crate::output::Outputable;

impl Outputable for CompileResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        let entities = self.verification_order.len();
        lines.push(format!(
            "Compiled {}: {} entit{} into {}",
            self.package,
            entities,
            if entities == 1 { "y" } else { "ies" },
            self.out_dir
        ));
        lines.push(String::new());

        if entities > 0 {
            lines.push(format!(
                "Verification order ({} failed attempt(s)):",
                self.failed_attempts
            ));
            lines.push(format!("  {}", self.verification_order.join(" -> ")));
            lines.push(String::new());
        }

        lines.push(format!("Wrote {} file(s):", self.files.len()));
        for file in &self.files {
            lines.push(format!("  {}", file));
        }

        lines.join("\n")
    }
}
