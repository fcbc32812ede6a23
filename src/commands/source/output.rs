//! Output formatting for source command results.

use crate::emit::GeneratedSource;
use crate::output::Outputable;

impl Outputable for GeneratedSource {
    fn to_table(&self) -> String {
        self.text.trim_end().to_string()
    }
}
