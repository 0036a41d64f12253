//! Type definitions for extracted schemas and detected changes

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JSON Schema `type` keyword values understood by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Null => "null",
            FieldType::Other(other) => other,
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "integer" => FieldType::Integer,
            "boolean" => FieldType::Boolean,
            "array" => FieldType::Array,
            "object" => FieldType::Object,
            "null" => FieldType::Null,
            _ => FieldType::Other(value),
        }
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        FieldType::from(value.to_string())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single property
///
/// Exactly one of a primitive `type`, an `array` with `items`, an `object`
/// with `properties` or an `anyOf` list describes the shape. `anyOf` wins over
/// `type` when both are present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, FieldSchema>>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub required: IndexSet<String>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    /// A field of the given primitive type
    pub fn of_type(field_type: impl Into<FieldType>) -> Self {
        Self {
            field_type: Some(field_type.into()),
            ..Self::default()
        }
    }

    /// A string field restricted to the given literals
    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_type: Some(FieldType::String),
            enum_values: Some(
                values
                    .into_iter()
                    .map(|v| serde_json::Value::String(v.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// An array of `items`
    pub fn array_of(items: FieldSchema) -> Self {
        Self {
            field_type: Some(FieldType::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// A union of alternatives
    pub fn any_of(alternatives: Vec<FieldSchema>) -> Self {
        Self {
            any_of: Some(alternatives),
            ..Self::default()
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The `type` keyword rendered as a string, if present
    pub fn type_name(&self) -> Option<String> {
        self.field_type.as_ref().map(|t| t.to_string())
    }

    /// Whether this field is a string carrying literal `enum` values
    pub fn is_string_enum(&self) -> bool {
        self.field_type == Some(FieldType::String) && self.enum_values.is_some()
    }
}

/// Informational data attached during extraction; never diffed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub model: String,
    pub container: String,
    pub module_path: String,
    pub extracted_at: DateTime<Utc>,
}

/// Normalized shape of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub name: String,
    pub properties: IndexMap<String, FieldSchema>,
    #[serde(default)]
    pub required: IndexSet<String>,
    pub metadata: SchemaMetadata,
}

impl SchemaDocument {
    /// Create an empty document with fresh metadata
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: IndexMap::new(),
            required: IndexSet::new(),
            metadata: SchemaMetadata {
                model: name.to_string(),
                container: String::new(),
                module_path: String::new(),
                extracted_at: Utc::now(),
            },
        }
    }

    /// Append a property, optionally marking it required
    pub fn with_field(mut self, name: &str, field: FieldSchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), field);
        if required {
            self.required.insert(name.to_string());
        }
        self
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.contains(field)
    }
}

/// Named collection of documents from one extraction pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSet {
    schemas: IndexMap<String, SchemaDocument>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, replacing any earlier one with the same name
    pub fn insert(&mut self, document: SchemaDocument) -> Option<SchemaDocument> {
        self.schemas.insert(document.name.clone(), document)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDocument> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<SchemaDocument> for SchemaSet {
    fn from_iter<T: IntoIterator<Item = SchemaDocument>>(iter: T) -> Self {
        let mut set = SchemaSet::new();
        for document in iter {
            set.insert(document);
        }
        set
    }
}

impl Extend<SchemaDocument> for SchemaSet {
    fn extend<T: IntoIterator<Item = SchemaDocument>>(&mut self, iter: T) {
        for document in iter {
            self.insert(document);
        }
    }
}

/// Kind of a detected difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => f.write_str("added"),
            ChangeType::Removed => f.write_str("removed"),
            ChangeType::Modified => f.write_str("modified"),
        }
    }
}

/// One detected difference between two schema sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub schema_name: String,
    pub change_type: ChangeType,
    pub field_name: Option<String>,
    pub old_type: Option<String>,
    pub new_type: Option<String>,
    pub description: String,
}

/// Breaking-change sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Strict,
    #[default]
    Moderate,
    Lenient,
}

impl FromStr for ValidationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ValidationLevel::Strict),
            "moderate" => Ok(ValidationLevel::Moderate),
            "lenient" => Ok(ValidationLevel::Lenient),
            other => Err(format!(
                "unknown validation level '{}' (expected strict, moderate or lenient)",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Strict => f.write_str("strict"),
            ValidationLevel::Moderate => f.write_str("moderate"),
            ValidationLevel::Lenient => f.write_str("lenient"),
        }
    }
}
