//! JSON Schema container
//!
//! Reads models from JSON Schema documents, e.g. the output of `schemars`.
//! A file holds either a single object schema (named by its `title`, else the
//! file stem) or a `definitions` / `$defs` map of named schemas.

use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ModelsConfig;
use crate::error::{Error, Result};
use crate::models::container::{ModelContainer, RawSchema};

/// Models read from one JSON file or a directory of them
#[derive(Debug)]
pub struct JsonSchemaContainer {
    path: String,
    /// Model name to (source file, schema)
    models: IndexMap<String, (String, Value)>,
}

impl JsonSchemaContainer {
    /// Load every `.json` document under `path`
    pub fn open(path: &Path, config: &ModelsConfig) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Container(format!(
                "Path does not exist: {}",
                path.display()
            )));
        }

        let mut models = IndexMap::new();
        for file in json_files(path, config) {
            let content = std::fs::read_to_string(&file)?;
            let document: Value = serde_json::from_str(&content).map_err(|e| {
                Error::Parse(format!("Invalid JSON in {}: {}", file.display(), e))
            })?;

            for (name, schema) in named_schemas(&file, document) {
                if models
                    .insert(name.clone(), (file.display().to_string(), schema))
                    .is_some()
                {
                    tracing::warn!(model = %name, file = %file.display(), "Duplicate schema name, keeping the last definition");
                }
            }
        }

        Ok(Self {
            path: path.display().to_string(),
            models,
        })
    }
}

impl ModelContainer for JsonSchemaContainer {
    fn path(&self) -> &str {
        &self.path
    }

    fn models(&self) -> Result<Vec<String>> {
        Ok(self.models.keys().cloned().collect())
    }

    fn get_schema(&self, model: &str) -> Result<RawSchema> {
        let (file, schema) = self.models.get(model).ok_or_else(|| {
            Error::Container(format!("Model '{}' not found in {}", model, self.path))
        })?;

        Ok(RawSchema {
            name: model.to_string(),
            module_path: file.clone(),
            schema: schema.clone(),
        })
    }
}

/// An object schema with properties is a model
pub fn is_model_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object")
        && schema.get("properties").map_or(false, Value::is_object)
}

fn named_schemas(file: &Path, mut document: Value) -> Vec<(String, Value)> {
    let mut found = Vec::new();

    for key in ["definitions", "$defs"] {
        if let Some(Value::Object(definitions)) = document.as_object_mut().and_then(|d| d.remove(key)) {
            found.extend(
                definitions
                    .into_iter()
                    .filter(|(_, schema)| is_model_schema(schema)),
            );
        }
    }

    if is_model_schema(&document) {
        let name = document
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| file.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();
        found.push((name, document));
    }

    found
}

fn json_files(path: &Path, config: &ModelsConfig) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let max_depth = if config.recursive_scan { usize::MAX } else { 1 };

    WalkDir::new(path)
        .follow_links(true)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|file| file.is_file() && file.extension().map_or(false, |ext| ext == "json"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_root_schema_and_definitions() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("order.json"),
            json!({
                "title": "Order",
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"],
                "$defs": {
                    "LineItem": {
                        "type": "object",
                        "properties": {"sku": {"type": "string"}}
                    },
                    "Currency": {"type": "string", "enum": ["EUR", "USD"]}
                }
            })
            .to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("customer.json"),
            json!({"type": "object", "properties": {"email": {"type": "string"}}}).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let container = JsonSchemaContainer::open(dir.path(), &ModelsConfig::default()).unwrap();

        assert_eq!(container.models().unwrap(), vec!["customer", "LineItem", "Order"]);
        let order = container.get_schema("Order").unwrap();
        assert!(order.schema.get("$defs").is_none());
        assert!(order.module_path.ends_with("order.json"));
    }

    #[test]
    fn invalid_json_fails_to_open() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "{ not json").unwrap();

        assert!(matches!(
            JsonSchemaContainer::open(&file, &ModelsConfig::default()),
            Err(Error::Parse(_))
        ));
    }
}
