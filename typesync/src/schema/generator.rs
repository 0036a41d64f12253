//! TypeScript declaration generator
//!
//! This module renders a schema set as a single TypeScript source file: a
//! banner, one string-literal union alias per enum field and one interface
//! per schema.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};
use crate::schema::types::{FieldSchema, FieldType, SchemaDocument, SchemaSet};
use crate::utils::naming::{find_duplicate_names, format_property_key, is_valid_identifier, title_case};

/// Fallback for objects without inline properties, `null` and unknown types
pub const OPEN_RECORD: &str = "Record<string, any>";

const INDENT: &str = "  ";

/// A derived `export type X = "a" | "b";` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclaration {
    pub name: String,
    pub type_expr: String,
}

/// TypeScript generator
#[derive(Debug, Clone)]
pub struct TypeScriptGenerator {
    tool_name: String,
    timestamp: Option<DateTime<Utc>>,
}

impl Default for TypeScriptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeScriptGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self {
            tool_name: "typesync".to_string(),
            timestamp: None,
        }
    }

    /// Name credited in the file banner
    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    /// Pin the banner timestamp instead of using the current time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Generate the complete declaration file for a schema set
    pub fn generate_file(&self, schemas: &SchemaSet) -> Result<String> {
        let mut output = self.generate_header();

        let enums = self.extract_enums(schemas)?;
        let duplicates = find_duplicate_names(enums.iter().map(|e| e.name.as_str()));
        if !duplicates.is_empty() {
            tracing::warn!(names = ?duplicates, "Derived enum names collide; emitting all declarations");
        }

        for declaration in &enums {
            output.push_str(&format!(
                "export type {} = {};\n\n",
                declaration.name, declaration.type_expr
            ));
        }

        for document in schemas.documents() {
            output.push_str(&self.generate_interface(document)?);
            output.push('\n');
        }

        tracing::debug!(
            schemas = schemas.len(),
            enums = enums.len(),
            bytes = output.len(),
            "Generated TypeScript declarations"
        );

        Ok(output)
    }

    /// Banner placed at the top of every generated file
    fn generate_header(&self) -> String {
        let timestamp = self
            .timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        format!(
            "/* eslint-disable */\n\
             /* tslint:disable */\n\
             /**\n \
             * This file was automatically generated by {tool}.\n \
             * Generated at: {timestamp}\n \
             * DO NOT MODIFY IT BY HAND. Instead, modify the source models\n \
             * and run {tool} again to regenerate this file.\n \
             */\n\n",
            tool = self.tool_name,
            timestamp = timestamp
        )
    }

    /// Collect one alias per top-level string field carrying `enum` values
    ///
    /// Aliases are named `{Schema}{Field}Enum` with the field title-cased.
    /// Colliding names are all kept.
    pub fn extract_enums(&self, schemas: &SchemaSet) -> Result<Vec<EnumDeclaration>> {
        let mut enums = Vec::new();

        for document in schemas.documents() {
            for (field_name, field) in &document.properties {
                if !field.is_string_enum() {
                    continue;
                }

                let type_expr = literal_union(field)
                    .map_err(|message| generation_error(document, field_name, message))?;

                enums.push(EnumDeclaration {
                    name: format!("{}{}Enum", document.name, title_case(field_name)),
                    type_expr,
                });
            }
        }

        Ok(enums)
    }

    /// Render one `export interface`
    pub fn generate_interface(&self, document: &SchemaDocument) -> Result<String> {
        if !is_valid_identifier(&document.name) {
            return Err(Error::Generation {
                schema: document.name.clone(),
                message: "schema name is not a valid TypeScript identifier".to_string(),
            });
        }

        let mut lines = vec![format!("export interface {} {{", document.name)];

        for (field_name, field) in &document.properties {
            if let Some(description) = &field.description {
                lines.extend(doc_comment(description, INDENT));
            }

            let type_expr =
                render_type(field).map_err(|message| generation_error(document, field_name, message))?;
            let marker = if document.is_required(field_name) { "" } else { "?" };

            lines.push(format!(
                "{}{}{}: {};",
                INDENT,
                format_property_key(field_name),
                marker,
                type_expr
            ));
        }

        lines.push("}".to_string());
        Ok(lines.join("\n") + "\n")
    }

    /// Map a field schema to a TypeScript type expression
    pub fn type_of(&self, field: &FieldSchema) -> Result<String> {
        render_type(field).map_err(|message| Error::Generation {
            schema: "<field>".to_string(),
            message,
        })
    }
}

fn generation_error(document: &SchemaDocument, field_name: &str, message: String) -> Error {
    Error::Generation {
        schema: document.name.clone(),
        message: format!("field '{}': {}", field_name, message),
    }
}

/// Recursive type mapping; `Err` carries a description of the malformed part
fn render_type(field: &FieldSchema) -> std::result::Result<String, String> {
    if let Some(alternatives) = &field.any_of {
        if alternatives.is_empty() {
            return Ok(OPEN_RECORD.to_string());
        }
        let rendered = alternatives
            .iter()
            .map(render_type)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        return Ok(rendered.join(" | "));
    }

    match &field.field_type {
        Some(FieldType::String) if field.enum_values.is_some() => literal_union(field),
        Some(FieldType::String) => Ok("string".to_string()),
        Some(FieldType::Number) | Some(FieldType::Integer) => Ok("number".to_string()),
        Some(FieldType::Boolean) => Ok("boolean".to_string()),
        Some(FieldType::Array) => {
            let items = field
                .items
                .as_deref()
                .ok_or_else(|| "array schema has no 'items'".to_string())?;
            let inner = render_type(items)?;
            if is_union(&inner) {
                Ok(format!("({})[]", inner))
            } else {
                Ok(format!("{}[]", inner))
            }
        }
        Some(FieldType::Object) => match &field.properties {
            Some(properties) if !properties.is_empty() => {
                let members = properties
                    .iter()
                    .map(|(name, property)| {
                        let marker = if field.required.contains(name) { "" } else { "?" };
                        render_type(property)
                            .map(|t| format!("{}{}: {}", format_property_key(name), marker, t))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(format!("{{ {} }}", members.join("; ")))
            }
            _ => Ok(OPEN_RECORD.to_string()),
        },
        Some(FieldType::Null) | Some(FieldType::Other(_)) | None => Ok(OPEN_RECORD.to_string()),
    }
}

/// `"a" | "b"` for the field's enum values
fn literal_union(field: &FieldSchema) -> std::result::Result<String, String> {
    match &field.enum_values {
        Some(values) if !values.is_empty() => Ok(values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" | ")),
        _ => Err("enum has no values".to_string()),
    }
}

/// Whether a rendered type has a `|` outside braces or parentheses
fn is_union(type_expr: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for c in type_expr.chars() {
        if in_string {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => in_string = false,
                _ => escaped = false,
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '(' | '<' => depth += 1,
            '}' | ')' | '>' => depth -= 1,
            '|' if depth == 0 => return true,
            _ => {}
        }
    }

    false
}

fn doc_comment(description: &str, indent: &str) -> Vec<String> {
    let escaped = description.trim().replace("*/", "*\\/");

    if !escaped.contains('\n') {
        return vec![format!("{}/** {} */", indent, escaped)];
    }

    let mut lines = vec![format!("{}/**", indent)];
    for line in escaped.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            lines.push(format!("{} *", indent));
        } else {
            lines.push(format!("{} * {}", indent, line));
        }
    }
    lines.push(format!("{} */", indent));
    lines
}
