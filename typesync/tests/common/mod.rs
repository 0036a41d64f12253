#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use typesync::schema::{FieldSchema, SchemaDocument};
use typesync::{SchemaSet, TypeScriptGenerator};

/// A schema set built from `(name, [(field, schema, required)])` entries
pub fn schema_set(schemas: Vec<(&str, Vec<(&str, FieldSchema, bool)>)>) -> SchemaSet {
    schemas
        .into_iter()
        .map(|(name, fields)| {
            fields
                .into_iter()
                .fold(SchemaDocument::new(name), |doc, (field, schema, required)| {
                    doc.with_field(field, schema, required)
                })
        })
        .collect()
}

pub fn string() -> FieldSchema {
    FieldSchema::of_type("string")
}

pub fn number() -> FieldSchema {
    FieldSchema::of_type("number")
}

pub fn integer() -> FieldSchema {
    FieldSchema::of_type("integer")
}

/// Generator with a pinned banner timestamp
pub fn generator() -> TypeScriptGenerator {
    TypeScriptGenerator::new().with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

/// Lines of the `export interface {name}` block, without the braces
pub fn interface_body<'a>(output: &'a str, name: &str) -> Vec<&'a str> {
    let header = format!("export interface {} {{", name);
    output
        .lines()
        .skip_while(|line| *line != header)
        .skip(1)
        .take_while(|line| *line != "}")
        .collect()
}
