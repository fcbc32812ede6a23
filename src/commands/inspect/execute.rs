use std::error::Error;

use serde::Serialize;

use super::InspectCmd;
use crate::commands::{read_schema, Execute};
use crate::compiler::Compiler;
use crate::config::ConfigFile;
use crate::emit::ddl::render_default;
use crate::error::CompilerError;
use crate::schema::entity::PRIMARY_KEY;
use crate::schema::naming::qualify_table_name;
use crate::schema::{Entity, Field};

/// One stored column of an entity table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub field: String,
    pub column: String,
    pub column_type: String,
    pub flags: Vec<String>,
    /// Referenced table and delete action, for entity references
    pub references: Option<String>,
}

/// One collection field and the junction table realizing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub field: String,
    pub element: String,
    pub junction: String,
    pub owner_column: String,
    pub element_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub name: String,
    pub table: String,
    pub columns: Vec<ColumnSummary>,
    pub collections: Vec<CollectionSummary>,
    pub capabilities: Vec<String>,
    pub warnings: Vec<String>,
}

/// Result of the inspect command execution
#[derive(Debug, Default, Serialize)]
pub struct InspectResult {
    pub package: String,
    pub entities: Vec<EntitySummary>,
}

impl Execute for InspectCmd {
    type Output = InspectResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let input = read_schema(&self.input)?;
        let model = Compiler::new(config.compiler_options())?.build_model(&input)?;

        let entities = match &self.entity {
            Some(name) => {
                let entity = model
                    .entity(name)
                    .ok_or_else(|| CompilerError::UnknownEntity(name.clone()))?;
                vec![summarize(entity)]
            }
            None => model.entities.iter().map(summarize).collect(),
        };

        Ok(InspectResult {
            package: model.package,
            entities,
        })
    }
}

fn summarize(entity: &Entity) -> EntitySummary {
    let primary_key = ColumnSummary {
        field: PRIMARY_KEY.to_string(),
        column: PRIMARY_KEY.to_uppercase(),
        column_type: "bigserial".to_string(),
        flags: vec!["primary key".to_string()],
        references: None,
    };

    let columns = std::iter::once(primary_key)
        .chain(entity.columns().map(summarize_column))
        .collect();

    let collections = entity
        .collections()
        .filter_map(|field| {
            let junction = field.junction()?;
            Some(CollectionSummary {
                field: field.name.clone(),
                element: field.referenced_entity()?.to_string(),
                junction: qualify_table_name(&junction.table_name, junction.schema.as_deref()),
                owner_column: junction.owner_column.to_uppercase(),
                element_column: junction.element_column.to_uppercase(),
            })
        })
        .collect();

    EntitySummary {
        name: entity.name.clone(),
        table: entity.qualified_table_name.clone(),
        columns,
        collections,
        capabilities: entity.capabilities.iter().cloned().collect(),
        warnings: entity.warnings.clone(),
    }
}

fn summarize_column(field: &Field) -> ColumnSummary {
    let mut flags = Vec::new();
    if field.required {
        flags.push("not null".to_string());
    }
    if field.unique {
        flags.push("unique".to_string());
    }
    if let Some(default) = &field.default_value {
        flags.push(format!("default {}", render_default(default)));
    }
    if field.is_last_modified() {
        flags.push("trigger".to_string());
    }
    if field.is_password() {
        flags.push("password".to_string());
    }

    let references = match (field.foreign_key(), field.referenced_entity()) {
        (Some(fk), _) => Some(format!(
            "{}(ID) on delete {}",
            qualify_table_name(&fk.referenced_table_name, fk.referenced_schema.as_deref()),
            fk.on_delete.as_sql()
        )),
        (None, Some(target)) => Some(format!("{} (self, no foreign key)", target)),
        (None, None) => None,
    };

    ColumnSummary {
        field: field.name.clone(),
        column: field.column_name.to_uppercase(),
        column_type: field
            .column_type
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        flags,
        references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::test_utils::create_temp_json_file;
    use rstest::{fixture, rstest};

    #[fixture]
    fn contacts() -> InspectResult {
        let file = create_temp_json_file(fixtures::CONTACTS);
        InspectCmd {
            input: file.path().to_path_buf(),
            entity: None,
        }
        .execute(&ConfigFile::default())
        .unwrap()
    }

    fn column<'a>(entity: &'a EntitySummary, field: &str) -> &'a ColumnSummary {
        entity.columns.iter().find(|c| c.field == field).unwrap()
    }

    #[rstest]
    fn test_entities_in_input_order(contacts: InspectResult) {
        let names: Vec<&str> = contacts.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Phone", "Contact", "User", "Role"]);
    }

    #[rstest]
    fn test_primary_key_first(contacts: InspectResult) {
        let phone = &contacts.entities[0];
        assert_eq!(phone.columns[0].column, "ID");
        assert_eq!(phone.columns[0].flags, vec!["primary key"]);
    }

    #[rstest]
    fn test_reference_column(contacts: InspectResult) {
        let phone = column(&contacts.entities[1], "phone");
        assert_eq!(phone.column, "PHONE_ID");
        assert_eq!(phone.column_type, "bigint");
        assert_eq!(phone.references.as_deref(), Some("PHONE(ID) on delete CASCADE"));
    }

    #[rstest]
    fn test_self_reference_has_no_foreign_key(contacts: InspectResult) {
        let manager = column(&contacts.entities[2], "manager");
        assert_eq!(manager.references.as_deref(), Some("User (self, no foreign key)"));
    }

    #[rstest]
    fn test_constraint_flags(contacts: InspectResult) {
        let email = column(&contacts.entities[1], "email");
        assert_eq!(email.column_type, "VARCHAR(128)");
        assert_eq!(email.flags, vec!["not null", "unique"]);

        let name = column(&contacts.entities[1], "name");
        assert_eq!(name.flags, vec!["default 'O''Brien'"]);
    }

    #[rstest]
    fn test_collection_summary(contacts: InspectResult) {
        let user = &contacts.entities[2];
        assert!(user.columns.iter().all(|c| c.field != "roles"));
        assert_eq!(
            user.collections,
            vec![CollectionSummary {
                field: "roles".to_string(),
                element: "Role".to_string(),
                junction: "USER_ROLE".to_string(),
                owner_column: "USER_ID".to_string(),
                element_column: "ROLE_ID".to_string(),
            }]
        );
    }

    #[rstest]
    fn test_single_entity() {
        let file = create_temp_json_file(fixtures::CONTACTS);
        let result = InspectCmd {
            input: file.path().to_path_buf(),
            entity: Some("Role".to_string()),
        }
        .execute(&ConfigFile::default())
        .unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].table, "ROLE");
    }

    #[rstest]
    fn test_unknown_entity() {
        let file = create_temp_json_file(fixtures::CONTACTS);
        let result = InspectCmd {
            input: file.path().to_path_buf(),
            entity: Some("Address".to_string()),
        }
        .execute(&ConfigFile::default());
        assert!(result.is_err());
    }
}
