//! Output formatting for inspect command results.

use super::execute::{EntitySummary, InspectResult};
use crate::output::{align_columns, Outputable};

impl Outputable for InspectResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Schema: {}", self.package));
        lines.push(String::new());

        if self.entities.is_empty() {
            lines.push("No entities declared.".to_string());
            return lines.join("\n");
        }

        lines.push(format!("Found {} entit{}:", self.entities.len(), if self.entities.len() == 1 { "y" } else { "ies" }));
        for entity in &self.entities {
            lines.push(String::new());
            format_entity(entity, &mut lines);
        }

        lines.join("\n")
    }
}

fn format_entity(entity: &EntitySummary, lines: &mut Vec<String>) {
    lines.push(format!("{} -> {}", entity.name, entity.table));

    let rows: Vec<Vec<String>> = entity
        .columns
        .iter()
        .map(|c| {
            vec![
                c.column.clone(),
                c.column_type.clone(),
                c.flags.join(", "),
                c.references.clone().unwrap_or_default(),
            ]
        })
        .collect();
    for row in align_columns(&rows) {
        lines.push(format!("  {}", row));
    }

    for collection in &entity.collections {
        lines.push(format!(
            "  {}: {}[] via {}({}, {})",
            collection.field,
            collection.element,
            collection.junction,
            collection.owner_column,
            collection.element_column
        ));
    }
    if !entity.capabilities.is_empty() {
        lines.push(format!("  implements: {}", entity.capabilities.join(", ")));
    }
    for warning in &entity.warnings {
        lines.push(format!("  warning: {}", warning));
    }
}
