//! Rust binding emitter.
//!
//! Renders one module per entity by filling the structural [`Template`], plus a
//! module index declaring every entity module. The generated code depends only
//! on the runtime API (`Row`, `Document`, `Connection`, `Value`,
//! `RuntimeError` and the `password` helpers) imported from a configurable
//! module path.

use serde::Serialize;
use tracing::debug;

use super::escape::rust_string_literal;
use super::template::{Bindings, Template, TemplateError};
use crate::schema::naming::qualify_table_name;
use crate::schema::{ColumnType, Entity, Field, FieldKind, JunctionTable, ObjectType, SchemaModel};
use crate::utils::rust_identifier;

/// Module the generated code imports its runtime API from.
pub const DEFAULT_RUNTIME: &str = "crate::runtime";

/// File name of the module index.
pub const MODULE_INDEX: &str = "mod.rs";

const RUNTIME_TYPES: &[&str] = &["Connection", "Document", "Row", "RuntimeError", "Value"];

/// Generated source of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSource {
    pub entity: String,
    /// Module name, equal to the entity's table name
    pub module: String,
    pub file_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Module path of the runtime API
    pub runtime: String,
    /// Emit `to_document`
    pub serialize: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            serialize: true,
        }
    }
}

pub struct ObjectSourceEmitter<'a> {
    template: &'a Template,
    options: &'a SourceOptions,
}

impl<'a> ObjectSourceEmitter<'a> {
    pub fn new(template: &'a Template, options: &'a SourceOptions) -> Self {
        Self { template, options }
    }

    /// Render the binding of one entity.
    pub fn emit(&self, model: &SchemaModel, entity: &Entity) -> Result<GeneratedSource, TemplateError> {
        let writer = EntityWriter::new(model, entity);
        let mut bindings = Bindings::new();
        bindings.insert("package", model.package.clone());
        bindings.insert("entity", entity.name.clone());
        bindings.insert("imports", writer.imports(&self.options.runtime));
        bindings.insert("statements", writer.statements());
        bindings.insert("fields", writer.fields());
        bindings.insert("table", rust_string_literal(&entity.qualified_table_name));
        bindings.insert("field_map", writer.field_map());
        bindings.insert("columns", rust_string_literal(&writer.select_list()));
        bindings.insert("conn_param", writer.conn_param().to_string());
        bindings.insert("row_reads", writer.row_reads());
        bindings.insert("document_reads", writer.document_reads());
        bindings.insert("accessors", writer.accessors());
        bindings.insert("save_body", writer.save_body());
        bindings.insert(
            "to_document",
            if self.options.serialize { writer.to_document() } else { String::new() },
        );
        bindings.insert("capabilities", writer.capabilities());

        let mut text = self.template.render(&bindings)?.trim_end().to_string();
        text.push('\n');

        debug!(entity = %entity.name, bytes = text.len(), "emitted source");
        Ok(GeneratedSource {
            entity: entity.name.clone(),
            module: entity.table_name.clone(),
            file_name: format!("{}.rs", entity.table_name),
            text,
        })
    }

    /// Render every entity in input order.
    pub fn emit_all(&self, model: &SchemaModel) -> Result<Vec<GeneratedSource>, TemplateError> {
        model
            .entities
            .iter()
            .map(|entity| self.emit(model, entity))
            .collect()
    }

    /// Module index declaring and re-exporting every entity module.
    pub fn module_index(model: &SchemaModel) -> String {
        let mut text = format!(
            "//! Bindings for the `{}` schema.\n//!\n//! Generated by modelc. Changes are overwritten on the next run.\n",
            model.package
        );
        if model.entities.is_empty() {
            return text;
        }

        let modules = model
            .entities
            .iter()
            .map(|e| format!("pub mod {};", rust_identifier(&e.table_name)))
            .collect::<Vec<_>>()
            .join("\n");
        let exports = model
            .entities
            .iter()
            .map(|e| format!("pub use {}::{};", rust_identifier(&e.table_name), e.name))
            .collect::<Vec<_>>()
            .join("\n");

        text.push('\n');
        text.push_str(&modules);
        text.push_str("\n\n");
        text.push_str(&exports);
        text.push('\n');
        text
    }
}

/// Renders the pieces of one entity's binding.
struct EntityWriter<'m> {
    entity: &'m Entity,
    /// Full path of a custom geometry type
    geometry_path: Option<&'m str>,
    /// Name the geometry type is used under
    geometry_type: &'m str,
}

impl<'m> EntityWriter<'m> {
    fn new(model: &'m SchemaModel, entity: &'m Entity) -> Self {
        let geometry_path = model.geometry.as_deref();
        let geometry_type = geometry_path
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or("Geometry");
        Self { entity, geometry_path, geometry_type }
    }

    fn rust_type(&self, field: &Field) -> String {
        field.object_type.rust_type(self.geometry_type)
    }

    /// Columns written by `save`; the trigger maintains `lastModified`.
    fn persisted(&self) -> Vec<&'m Field> {
        self.entity
            .columns()
            .filter(|f| !f.is_last_modified())
            .collect()
    }

    fn imports(&self, runtime: &str) -> String {
        let mut runtime_items: Vec<&str> = RUNTIME_TYPES.to_vec();
        let uses = |object_type: ObjectType| self.entity.fields.iter().any(|f| f.object_type == object_type);
        if uses(ObjectType::Decimal) {
            runtime_items.push("Decimal");
        }
        if uses(ObjectType::Date) {
            runtime_items.push("DateTime");
        }
        if uses(ObjectType::Json) {
            runtime_items.push("Json");
        }
        let has_geometry = uses(ObjectType::Geometry);
        if has_geometry && self.geometry_path.is_none() {
            runtime_items.push("Geometry");
        }
        runtime_items.sort_unstable();
        if uses(ObjectType::Password) {
            runtime_items.push("password");
        }

        let mut lines = vec![format!("use {}::{{{}}};", runtime, runtime_items.join(", "))];
        if let Some(path) = self.geometry_path.filter(|_| has_geometry) {
            lines.push(format!("use {};", path));
        }

        let mut referenced = self.entity.referenced_entities();
        referenced.sort_unstable();
        match referenced.as_slice() {
            [] => {}
            [single] => lines.push(format!("use super::{};", single)),
            many => lines.push(format!("use super::{{{}}};", many.join(", "))),
        }
        lines.join("\n")
    }

    fn statements(&self) -> String {
        let table = &self.entity.qualified_table_name;
        let persisted = self.persisted();
        let mut lines = vec![format!(
            "const SELECT_SQL: &str = {};",
            rust_string_literal(&format!(
                "SELECT {} FROM {} WHERE ID = $1",
                self.select_list(),
                table
            ))
        )];

        if persisted.is_empty() {
            lines.push(format!(
                "const INSERT_SQL: &str = {};",
                rust_string_literal(&format!("INSERT INTO {} DEFAULT VALUES RETURNING ID", table))
            ));
            return lines.join("\n");
        }

        let columns = persisted
            .iter()
            .map(|f| f.column_name.to_uppercase())
            .collect::<Vec<_>>();
        let placeholders = persisted
            .iter()
            .enumerate()
            .map(|(i, f)| parameter(f, i + 1))
            .collect::<Vec<_>>();
        let assignments = columns
            .iter()
            .zip(&placeholders)
            .map(|(column, placeholder)| format!("{} = {}", column, placeholder))
            .collect::<Vec<_>>();

        lines.push(format!(
            "const INSERT_SQL: &str = {};",
            rust_string_literal(&format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING ID",
                table,
                columns.join(", "),
                placeholders.join(", ")
            ))
        ));
        lines.push(format!(
            "const UPDATE_SQL: &str = {};",
            rust_string_literal(&format!(
                "UPDATE {} SET {} WHERE ID = ${}",
                table,
                assignments.join(", "),
                persisted.len() + 1
            ))
        ));
        lines.join("\n")
    }

    fn fields(&self) -> String {
        self.entity
            .fields
            .iter()
            .map(|f| match f.kind() {
                FieldKind::EntityArray => format!("    {}: {},", f.rust_name(), self.rust_type(f)),
                _ => format!("    {}: Option<{}>,", f.rust_name(), self.rust_type(f)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn field_map(&self) -> String {
        self.entity
            .columns()
            .map(|f| format!("        ({:?}, {:?}),", f.name, f.column_name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `ID, NAME, ST_AsText(LOCATION) AS LOCATION`
    fn select_list(&self) -> String {
        std::iter::once("ID".to_string())
            .chain(self.entity.columns().map(|f| {
                let column = f.column_name.to_uppercase();
                if f.is_geometry() {
                    format!("ST_AsText({}) AS {}", column, column)
                } else {
                    column
                }
            }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn conn_param(&self) -> &'static str {
        if self.entity.collections().next().is_some() {
            "conn"
        } else {
            "_conn"
        }
    }

    fn row_reads(&self) -> String {
        self.entity
            .fields
            .iter()
            .map(|f| {
                let name = f.rust_name();
                match (&f.object_type, f.junction()) {
                    (ObjectType::EntityList(element), Some(junction)) => {
                        format!(
                            "        entity.{name} = conn\n            .query({sql}, &[Value::from(entity.id)])?\n            .iter()\n            .map(|row| row.get({column:?}).as_i64())\n            .collect::<Result<Vec<_>, _>>()?\n            .into_iter()\n            .flatten()\n            .map({element}::with_id)\n            .collect();",
                            sql = rust_string_literal(&junction_select(junction)),
                            column = junction.element_column.to_lowercase(),
                        )
                    }
                    (ObjectType::Entity(target), _) => format!(
                        "        entity.{name} = row.get({column:?}).as_i64()?.map(|id| Box::new({target}::with_id(id)));",
                        column = f.column_name,
                    ),
                    (object_type, _) => format!(
                        "        entity.{name} = row.get({column:?}).{read};",
                        column = f.column_name,
                        read = value_read(object_type),
                    ),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn document_reads(&self) -> String {
        self.entity
            .fields
            .iter()
            .map(|f| {
                let name = f.rust_name();
                let key = &f.name;
                match &f.object_type {
                    ObjectType::EntityList(element) => format!(
                        "        entity.{name} = doc\n            .get({key:?})\n            .as_document_list()?\n            .into_iter()\n            .map({element}::from_document)\n            .collect::<Result<Vec<_>, _>>()?;"
                    ),
                    ObjectType::Entity(target) => format!(
                        "        entity.{name} = match doc.get({key:?}).as_document()? {{\n            Some(nested) => Some(Box::new({target}::from_document(nested)?)),\n            None => doc.get({id_key:?}).as_i64()?.map(|id| Box::new({target}::with_id(id))),\n        }};",
                        id_key = format!("{}ID", key),
                    ),
                    object_type => format!(
                        "        entity.{name} = doc.get({key:?}).{read};",
                        read = value_read(object_type),
                    ),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn accessors(&self) -> String {
        let mut methods = Vec::new();
        for f in &self.entity.fields {
            if let Some(accessor) = f.accessor_name() {
                methods.push(self.getter(f, &rust_identifier(&accessor)));
            }
            if let Some(authenticator) = f.authenticator_name() {
                methods.push(format!(
                    "    /// Checks a plaintext candidate against the stored hash.\n    pub fn {authenticator}(&self, candidate: &str) -> bool {{\n        self.{name}\n            .as_deref()\n            .is_some_and(|hash| password::verify(candidate, hash))\n    }}",
                    name = f.rust_name(),
                ));
            }
            if let Some(mutator) = f.mutator_name() {
                methods.push(self.setter(f, &mutator));
            }
            if let (Some(appender), ObjectType::EntityList(element)) =
                (f.appender_name(), &f.object_type)
            {
                methods.push(format!(
                    "    pub fn {appender}(&mut self, item: {element}) {{\n        self.{name}.push(item);\n    }}",
                    name = f.rust_name(),
                ));
            }
        }
        methods
            .into_iter()
            .map(|method| format!("\n{}\n", method))
            .collect()
    }

    fn getter(&self, f: &Field, accessor: &str) -> String {
        let name = f.rust_name();
        let (returns, body) = match &f.object_type {
            ObjectType::Entity(target) => (format!("Option<&{}>", target), format!("self.{}.as_deref()", name)),
            ObjectType::EntityList(element) => (format!("&[{}]", element), format!("&self.{}", name)),
            object_type if object_type.is_copy() => {
                (format!("Option<{}>", self.rust_type(f)), format!("self.{}", name))
            }
            _ => (format!("Option<&{}>", self.rust_type(f)), format!("self.{}.as_ref()", name)),
        };
        format!("    pub fn {accessor}(&self) -> {returns} {{\n        {body}\n    }}")
    }

    fn setter(&self, f: &Field, mutator: &str) -> String {
        let name = f.rust_name();
        match &f.object_type {
            ObjectType::Password => format!(
                "    /// Stores the hash of a plaintext value. Values that are already hashes are kept.\n    pub fn {mutator}(&mut self, value: Option<String>) {{\n        self.{name} = value.map(|v| if password::is_hash(&v) {{ v }} else {{ password::hash(&v) }});\n    }}"
            ),
            ObjectType::Entity(target) => format!(
                "    pub fn {mutator}(&mut self, value: Option<{target}>) {{\n        self.{name} = value.map(Box::new);\n    }}"
            ),
            ObjectType::EntityList(element) => format!(
                "    pub fn {mutator}(&mut self, values: Vec<{element}>) {{\n        self.{name} = values;\n    }}"
            ),
            _ => format!(
                "    pub fn {mutator}(&mut self, value: Option<{ty}>) {{\n        self.{name} = value;\n    }}",
                ty = self.rust_type(f),
            ),
        }
    }

    fn save_body(&self) -> String {
        let persisted = self.persisted();
        let mut lines = Vec::new();

        if persisted.is_empty() {
            lines.push(
                "        let id = match self.id {\n            Some(id) => id,\n            None => conn.insert_returning_id(INSERT_SQL, &[])?,\n        };"
                    .to_string(),
            );
        } else {
            let params = persisted
                .iter()
                .map(|f| format!("            Value::from({}),", owned_value(f)))
                .collect::<Vec<_>>()
                .join("\n");
            lines.push(format!("        let params = [\n{}\n        ];", params));
            lines.push(
                "        let id = match self.id {\n            Some(id) => {\n                let mut update = params.to_vec();\n                update.push(Value::from(id));\n                conn.execute(UPDATE_SQL, &update)?;\n                id\n            }\n            None => conn.insert_returning_id(INSERT_SQL, &params)?,\n        };"
                    .to_string(),
            );
        }
        lines.push("        self.id = Some(id);".to_string());

        for f in self.entity.collections() {
            let Some(junction) = f.junction() else { continue };
            let name = f.rust_name();
            let table = junction_table_name(junction);
            lines.push(format!(
                "        for item in self.{name}.iter_mut() {{\n            item.save(conn)?;\n        }}\n        conn.execute({delete}, &[Value::from(id)])?;\n        for item in &self.{name} {{\n            conn.execute(\n                {insert},\n                &[Value::from(id), Value::from(item.id())],\n            )?;\n        }}",
                delete = rust_string_literal(&format!(
                    "DELETE FROM {} WHERE {} = $1",
                    table, junction.owner_column
                )),
                insert = rust_string_literal(&format!(
                    "INSERT INTO {} ({}, {}) VALUES ($1, $2)",
                    table, junction.owner_column, junction.element_column
                )),
            ));
        }

        lines.push("        Ok(id)".to_string());
        lines.join("\n")
    }

    fn to_document(&self) -> String {
        let mut lines = vec![
            "        let mut doc = Document::new();".to_string(),
            "        doc.set(\"id\", self.id);".to_string(),
        ];
        for f in &self.entity.fields {
            let name = f.rust_name();
            let key = &f.name;
            let line = match &f.object_type {
                ObjectType::Password => format!("        doc.set({key:?}, Value::Null);"),
                ObjectType::Entity(_) => format!(
                    "        doc.set({id_key:?}, self.{name}.as_ref().and_then(|item| item.id()));",
                    id_key = format!("{}ID", key),
                ),
                ObjectType::EntityList(element) => format!(
                    "        doc.set(\n            {key:?},\n            self.{name}.iter().map({element}::to_document).collect::<Vec<_>>(),\n        );"
                ),
                _ => format!("        doc.set({key:?}, {});", owned_value(f)),
            };
            lines.push(line);
        }
        lines.push("        doc".to_string());

        format!(
            "\n    pub fn to_document(&self) -> Document {{\n{}\n    }}\n",
            lines.join("\n")
        )
    }

    fn capabilities(&self) -> String {
        self.entity
            .capabilities
            .iter()
            .map(|capability| format!("\nimpl {} for {} {{}}\n", capability, self.entity.name))
            .collect()
    }
}

/// Value expression for a stored field, cloning where needed.
fn owned_value(f: &Field) -> String {
    let name = f.rust_name();
    match &f.object_type {
        ObjectType::Entity(_) => format!("self.{}.as_ref().and_then(|item| item.id())", name),
        object_type if object_type.is_copy() => format!("self.{}", name),
        _ => format!("self.{}.clone()", name),
    }
}

/// Accessor call reading a scalar; JSON and geometry parse errors are swallowed.
fn value_read(object_type: &ObjectType) -> String {
    if object_type.is_best_effort() {
        format!("{}().ok().flatten()", object_type.value_accessor())
    } else {
        format!("{}()?", object_type.value_accessor())
    }
}

/// Positional parameter, wrapped for geometry columns.
fn parameter(f: &Field, index: usize) -> String {
    match &f.column_type {
        Some(ColumnType::Geometry { srid: Some(srid), .. }) => {
            format!("ST_GeomFromText(${}, {})", index, srid)
        }
        Some(ColumnType::Geometry { srid: None, .. }) => format!("ST_GeomFromText(${})", index),
        _ => format!("${}", index),
    }
}

fn junction_table_name(junction: &JunctionTable) -> String {
    qualify_table_name(&junction.table_name, junction.schema.as_deref())
}

fn junction_select(junction: &JunctionTable) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        junction.element_column,
        junction_table_name(junction),
        junction.owner_column
    )
}
