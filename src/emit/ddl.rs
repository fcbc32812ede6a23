//! PostgreSQL DDL compiler.
//!
//! Generates the full schema script for a [`SchemaModel`]. Statements are
//! emitted in a fixed order so that no statement refers to a table that does
//! not exist yet:
//!
//! 1. `CREATE SCHEMA` per namespace, `CREATE EXTENSION postgis` if needed
//! 2. `CREATE TABLE` per entity, without foreign keys
//! 3. junction tables, their foreign keys and indexes
//! 4. `ALTER TABLE ... ADD FOREIGN KEY` per entity reference
//! 5. foreign key and spatial indexes
//! 6. the `last_modified()` procedure and one trigger per entity using it
//!
//! Output is deterministic for a given model.

use tracing::debug;

use super::escape::sql_string_literal;
use crate::schema::naming::{escape_table_name, qualify_table_name};
use crate::schema::{DefaultValue, Entity, Field, JunctionTable, SchemaModel};

/// Shared trigger procedure maintaining `LAST_MODIFIED` columns.
pub const LAST_MODIFIED_PROCEDURE: &str = "CREATE OR REPLACE FUNCTION last_modified() RETURNS trigger AS $last_modified$
    BEGIN
        NEW.LAST_MODIFIED := current_timestamp;
        RETURN NEW;
    END;
$last_modified$ LANGUAGE plpgsql;";

/// Compiler for generating PostgreSQL DDL from a schema model.
pub struct PostgresDdlCompiler;

impl PostgresDdlCompiler {
    /// Generate the complete script for every entity in the model.
    pub fn compile(model: &SchemaModel) -> String {
        let mut script = String::new();

        let mut header: Vec<String> = model
            .schemas()
            .into_iter()
            .map(|schema| format!("CREATE SCHEMA IF NOT EXISTS {};", escape_table_name(schema, true)))
            .collect();
        if model.has_geometry() {
            header.push("CREATE EXTENSION IF NOT EXISTS postgis;".to_string());
        }
        push_section(&mut script, header, "\n");

        let tables = model.entities.iter().map(Self::compile_table).collect();
        push_section(&mut script, tables, "\n\n");

        let junctions = model
            .entities
            .iter()
            .flat_map(|e| e.collections())
            .filter_map(Field::junction)
            .map(Self::compile_junction_table)
            .collect();
        push_section(&mut script, junctions, "\n\n");

        let foreign_keys = model
            .entities
            .iter()
            .flat_map(Self::compile_foreign_keys)
            .collect();
        push_section(&mut script, foreign_keys, "\n\n");

        let indexes = model.entities.iter().flat_map(Self::compile_indexes).collect();
        push_section(&mut script, indexes, "\n");

        if model.has_last_modified() {
            push_section(&mut script, vec![LAST_MODIFIED_PROCEDURE.to_string()], "\n");
            let triggers = model
                .entities
                .iter()
                .filter_map(Self::compile_trigger)
                .collect();
            push_section(&mut script, triggers, "\n\n");
        }

        debug!(
            entities = model.entities.len(),
            bytes = script.len(),
            "compiled DDL script"
        );
        script
    }

    /// Generate the `CREATE TABLE` statement for one entity.
    ///
    /// ```sql
    /// CREATE TABLE CONTACT (
    ///     ID BIGSERIAL NOT NULL,
    ///     NAME varchar NOT NULL,
    ///     PHONE_ID bigint,
    ///     CONSTRAINT PK_CONTACT PRIMARY KEY (ID)
    /// );
    /// ```
    pub fn compile_table(entity: &Entity) -> String {
        let mut lines = vec!["    ID BIGSERIAL NOT NULL".to_string()];
        lines.extend(entity.columns().map(column_definition));
        lines.push(format!(
            "    CONSTRAINT PK_{} PRIMARY KEY (ID)",
            entity.table_name.to_uppercase()
        ));

        format!(
            "CREATE TABLE {} (\n{}\n);",
            entity.qualified_table_name,
            lines.join(",\n")
        )
    }

    /// Generate the junction table for a collection, with both foreign keys
    /// and one index per column.
    pub fn compile_junction_table(junction: &JunctionTable) -> String {
        let table = qualify_table_name(&junction.table_name, junction.schema.as_deref());
        let owner = qualify_table_name(&junction.owner_table, junction.owner_schema.as_deref());
        let element =
            qualify_table_name(&junction.element_table, junction.element_schema.as_deref());
        let index_prefix = format!("IDX_{}_", junction.table_name);

        let create = format!(
            "CREATE TABLE {} (\n    {} BIGINT NOT NULL,\n    {} BIGINT NOT NULL\n);",
            table, junction.owner_column, junction.element_column
        );
        let owner_fk = format!(
            "ALTER TABLE {} ADD CONSTRAINT FK_{} FOREIGN KEY ({}) REFERENCES {}(ID)\n    ON DELETE CASCADE ON UPDATE NO ACTION;",
            table, junction.table_name, junction.owner_column, owner
        );
        let element_fk = format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {}(ID)\n    ON DELETE CASCADE ON UPDATE NO ACTION;",
            table, junction.element_column, element
        );
        let indexes = [&junction.owner_column, &junction.element_column]
            .iter()
            .map(|column| {
                format!(
                    "CREATE INDEX {}{} ON {}({});",
                    index_prefix, column, table, column
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n\n{}\n\n{}\n\n{}", create, owner_fk, element_fk, indexes)
    }

    /// Generate one `ALTER TABLE ... ADD FOREIGN KEY` per entity reference.
    pub fn compile_foreign_keys(entity: &Entity) -> Vec<String> {
        entity
            .fields
            .iter()
            .filter_map(Field::foreign_key)
            .map(|fk| {
                format!(
                    "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {}(ID)\n    ON DELETE {} ON UPDATE NO ACTION;",
                    entity.qualified_table_name,
                    fk.column_name.to_uppercase(),
                    qualify_table_name(&fk.referenced_table_name, fk.referenced_schema.as_deref()),
                    fk.on_delete
                )
            })
            .collect()
    }

    /// Generate indexes for foreign key columns and GiST indexes for geometry columns.
    pub fn compile_indexes(entity: &Entity) -> Vec<String> {
        let table = entity.table_name.to_uppercase();
        entity
            .columns()
            .filter_map(|field| {
                let column = field.column_name.to_uppercase();
                if field.foreign_key().is_some() {
                    Some(format!(
                        "CREATE INDEX IDX_{}_{} ON {}({});",
                        table, column, entity.qualified_table_name, column
                    ))
                } else if field.is_geometry() {
                    Some(format!(
                        "CREATE INDEX IDX_{}_{} ON {} USING GIST({});",
                        table, column, entity.qualified_table_name, column
                    ))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Generate the update trigger for an entity with a `lastModified` field.
    pub fn compile_trigger(entity: &Entity) -> Option<String> {
        entity.has_last_modified().then(|| {
            format!(
                "CREATE TRIGGER TGR_{}_UPDATE BEFORE INSERT OR UPDATE ON {}\n    FOR EACH ROW EXECUTE PROCEDURE last_modified();",
                entity.table_name.to_uppercase(),
                entity.qualified_table_name
            )
        })
    }
}

/// `NAME type [NOT NULL] [DEFAULT x] [UNIQUE]`
fn column_definition(field: &Field) -> String {
    let mut column = format!("    {}", field.column_name.to_uppercase());
    if let Some(column_type) = &field.column_type {
        column.push(' ');
        column.push_str(&column_type.to_string());
    }
    if field.required {
        column.push_str(" NOT NULL");
    }
    if let Some(default) = &field.default_value {
        column.push_str(" DEFAULT ");
        column.push_str(&render_default(default));
    }
    if field.unique {
        column.push_str(" UNIQUE");
    }
    column
}

/// Function calls are emitted verbatim, other text is quoted.
pub fn render_default(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Text(text) if default.is_function_call() => text.clone(),
        DefaultValue::Text(text) => sql_string_literal(text),
        DefaultValue::Literal(literal) => literal.clone(),
    }
}

/// Appends a group of statements, separated from the previous group by a blank line.
fn push_section(script: &mut String, statements: Vec<String>, separator: &str) {
    if statements.is_empty() {
        return;
    }
    if !script.is_empty() {
        script.push('\n');
    }
    script.push_str(&statements.join(separator));
    script.push('\n');
}
