//! Schema extraction
//!
//! Turns the raw JSON-Schema values produced by model containers into
//! normalized [`SchemaDocument`]s and merges them into one [`SchemaSet`].

use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::container::{ContainerCatalog, ModelContainer, RawSchema};
use crate::schema::types::{FieldSchema, SchemaDocument, SchemaMetadata, SchemaSet};

/// A container or model that was skipped during extraction
#[derive(Debug)]
pub struct ContainerFailure {
    pub container: String,
    pub error: Error,
}

/// Result of one extraction pass over several containers
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub schemas: SchemaSet,
    pub failures: Vec<ContainerFailure>,
    /// Containers whose model list could be read
    pub containers_loaded: usize,
}

impl ExtractionOutcome {
    /// True when containers were attempted and none of them could be read
    pub fn all_failed(&self) -> bool {
        self.containers_loaded == 0 && !self.failures.is_empty()
    }
}

/// Extracts schemas from model containers
#[derive(Clone, Default)]
pub struct SchemaExtractor {
    catalog: ContainerCatalog,
}

impl SchemaExtractor {
    pub fn new(catalog: ContainerCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ContainerCatalog {
        &self.catalog
    }

    /// Extract one model from a container
    pub fn extract(&self, container: &dyn ModelContainer, model: &str) -> Result<SchemaDocument> {
        let raw = container
            .get_schema(model)
            .map_err(|e| Error::extraction(model, e))?;

        build_document(model, container.path(), raw).map_err(|e| Error::extraction(model, e))
    }

    /// Extract every model of every named container
    ///
    /// A container that cannot be resolved or listed is skipped with a
    /// warning, as is a single model that fails extraction; its siblings and
    /// the other containers still contribute their schemas.
    pub fn extract_all(&self, names: &[String]) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::default();

        for name in names {
            let containers = match self.catalog.resolve(name) {
                Ok(containers) => containers,
                Err(error) => {
                    tracing::warn!(container = %name, error = %error, "Skipping container that could not be loaded");
                    outcome.failures.push(ContainerFailure {
                        container: name.clone(),
                        error,
                    });
                    continue;
                }
            };

            for container in containers {
                self.extract_container(container.as_ref(), &mut outcome);
            }
        }

        tracing::info!(
            schemas = outcome.schemas.len(),
            loaded = outcome.containers_loaded,
            failed = outcome.failures.len(),
            "Schema extraction finished"
        );

        outcome
    }

    /// Fold one container into the outcome, model by model
    fn extract_container(&self, container: &dyn ModelContainer, outcome: &mut ExtractionOutcome) {
        let models = match container.models() {
            Ok(models) => models,
            Err(error) => {
                tracing::warn!(container = container.path(), error = %error, "Skipping container");
                outcome.failures.push(ContainerFailure {
                    container: container.path().to_string(),
                    error,
                });
                return;
            }
        };
        outcome.containers_loaded += 1;

        let mut extracted = 0;
        for model in &models {
            match self.extract(container, model) {
                Ok(document) => {
                    extracted += 1;
                    if let Some(previous) = outcome.schemas.insert(document) {
                        tracing::warn!(
                            schema = %previous.name,
                            previous_container = %previous.metadata.container,
                            "Schema defined by several containers, keeping the last one"
                        );
                    }
                }
                Err(error) => {
                    tracing::warn!(container = container.path(), model = %model, error = %error, "Skipping model");
                    outcome.failures.push(ContainerFailure {
                        container: container.path().to_string(),
                        error,
                    });
                }
            }
        }

        tracing::debug!(container = container.path(), schemas = extracted, "Extracted container");
    }
}

fn build_document(model: &str, container: &str, raw: RawSchema) -> Result<SchemaDocument> {
    let mut schema = raw.schema;
    let object = schema
        .as_object_mut()
        .ok_or_else(|| Error::Parse(format!("schema for '{}' is not a JSON object", raw.name)))?;

    let properties = match object.remove("properties") {
        Some(Value::Object(properties)) => properties
            .into_iter()
            .map(|(name, mut field)| {
                normalize(&mut field);
                let field: FieldSchema = serde_json::from_value(field).map_err(|e| {
                    Error::Parse(format!("invalid schema for field '{}': {}", name, e))
                })?;
                Ok((name, field))
            })
            .collect::<Result<IndexMap<_, _>>>()?,
        Some(other) => {
            return Err(Error::Parse(format!(
                "'properties' must be an object, found {}",
                other
            )))
        }
        None => IndexMap::new(),
    };

    Ok(SchemaDocument {
        name: raw.name,
        properties,
        required: required_names(object.get("required")),
        metadata: SchemaMetadata {
            model: model.to_string(),
            container: container.to_string(),
            module_path: raw.module_path,
            extracted_at: Utc::now(),
        },
    })
}

fn required_names(value: Option<&Value>) -> IndexSet<String> {
    value
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Rewrite the JSON Schema dialects we accept into the subset `FieldSchema` reads
///
/// `oneOf` becomes `anyOf`, a `type` array becomes `anyOf` alternatives and
/// a non-array `required` is dropped.
pub fn normalize(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };

    if !object.contains_key("anyOf") {
        if let Some(one_of) = object.remove("oneOf") {
            object.insert("anyOf".to_string(), one_of);
        }
    }

    if let Some(Value::Array(types)) = object.get("type").cloned() {
        object.remove("type");
        let description = object.remove("description");
        let alternatives = types
            .iter()
            .filter_map(Value::as_str)
            .map(|t| type_alternative(object, t))
            .collect();

        object.clear();
        object.insert("anyOf".to_string(), Value::Array(alternatives));
        if let Some(description) = description {
            object.insert("description".to_string(), description);
        }
    }

    if object.get("required").map_or(false, |r| !r.is_array()) {
        object.remove("required");
    }

    if let Some(items) = object.get_mut("items") {
        normalize(items);
    }
    if let Some(Value::Object(properties)) = object.get_mut("properties") {
        properties.values_mut().for_each(normalize);
    }
    if let Some(Value::Array(alternatives)) = object.get_mut("anyOf") {
        alternatives.iter_mut().for_each(normalize);
    }
}

/// One member of an expanded `type` array, keeping the keywords that apply to it
fn type_alternative(base: &Map<String, Value>, field_type: &str) -> Value {
    let mut alternative = Map::new();
    alternative.insert("type".to_string(), Value::String(field_type.to_string()));

    let keywords: &[&str] = match field_type {
        "string" => &["enum"],
        "array" => &["items"],
        "object" => &["properties", "required"],
        _ => &[],
    };
    for keyword in keywords {
        if let Some(value) = base.get(*keyword) {
            alternative.insert(keyword.to_string(), value.clone());
        }
    }

    Value::Object(alternative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::{ModelRegistry, TypeSyncModel};
    use crate::models::rust_types::{FieldDescriptor, ModelDescriptor};
    use crate::schema::types::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Fixed {
        schemas: Vec<(String, Value)>,
        broken: Option<String>,
    }

    impl ModelContainer for Fixed {
        fn path(&self) -> &str {
            "fixed"
        }

        fn models(&self) -> Result<Vec<String>> {
            Ok(self.schemas.iter().map(|(name, _)| name.clone()).collect())
        }

        fn get_schema(&self, model: &str) -> Result<RawSchema> {
            if self.broken.as_deref() == Some(model) {
                return Err(Error::Container("introspection blew up".to_string()));
            }
            let (name, schema) = self
                .schemas
                .iter()
                .find(|(name, _)| name == model)
                .ok_or_else(|| Error::Container("missing".to_string()))?;
            Ok(RawSchema {
                name: name.clone(),
                module_path: "app::models".to_string(),
                schema: schema.clone(),
            })
        }
    }

    fn user_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "nickname": {"type": ["string", "null"], "description": "Display name"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "contact": {"oneOf": [{"type": "string"}, {"type": "object", "properties": {"email": {"type": "string"}}}]},
                "extra": {"$ref": "#/definitions/Extra"}
            },
            "required": ["id"]
        })
    }

    #[test]
    fn extract_normalizes_and_attaches_metadata() {
        let container = Fixed {
            schemas: vec![("User".to_string(), user_schema())],
            broken: None,
        };

        let document = SchemaExtractor::default().extract(&container, "User").unwrap();

        assert_eq!(document.name, "User");
        assert_eq!(
            document.properties.keys().collect::<Vec<_>>(),
            vec!["id", "nickname", "tags", "contact", "extra"]
        );
        assert!(document.is_required("id"));
        assert!(!document.is_required("nickname"));
        assert_eq!(
            document.properties["nickname"],
            FieldSchema::any_of(vec![
                FieldSchema::of_type("string"),
                FieldSchema::of_type("null")
            ])
            .with_description("Display name")
        );
        assert_eq!(
            document.properties["tags"],
            FieldSchema::array_of(FieldSchema::of_type(FieldType::String))
        );
        assert_eq!(document.properties["contact"].any_of.as_ref().unwrap().len(), 2);
        assert_eq!(document.properties["extra"], FieldSchema::default());
        assert_eq!(document.metadata.model, "User");
        assert_eq!(document.metadata.container, "fixed");
        assert_eq!(document.metadata.module_path, "app::models");
    }

    #[test]
    fn missing_required_is_empty() {
        let container = Fixed {
            schemas: vec![("Note".to_string(), json!({"properties": {"body": {"type": "string"}}}))],
            broken: None,
        };

        let document = SchemaExtractor::default().extract(&container, "Note").unwrap();
        assert!(document.required.is_empty());
    }

    #[test]
    fn provider_failure_is_an_extraction_error() {
        let container = Fixed {
            schemas: vec![("User".to_string(), user_schema())],
            broken: Some("User".to_string()),
        };

        let error = SchemaExtractor::default().extract(&container, "User").unwrap_err();
        match error {
            Error::Extraction { model, .. } => assert_eq!(model, "User"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_object_schema_is_rejected() {
        let container = Fixed {
            schemas: vec![("Weird".to_string(), json!("nope"))],
            broken: None,
        };

        assert!(SchemaExtractor::default().extract(&container, "Weird").is_err());
    }

    struct Account;

    impl TypeSyncModel for Account {
        fn describe() -> ModelDescriptor {
            ModelDescriptor {
                name: "Account".to_string(),
                module_path: "app::accounts".to_string(),
                attributes: vec![],
                fields: vec![FieldDescriptor {
                    name: "balance".to_string(),
                    rust_type: "f64".to_string(),
                    docs: vec![],
                    attributes: vec![],
                }],
            }
        }
    }

    #[test]
    fn extract_all_skips_unresolvable_containers() {
        let mut registry = ModelRegistry::new("accounts");
        registry.register::<Account>();
        let extractor = SchemaExtractor::new(ContainerCatalog::default().with_registry(registry));

        let outcome = extractor.extract_all(&[
            "/no/such/models".to_string(),
            "registry:accounts".to_string(),
        ]);

        assert_eq!(outcome.schemas.names().collect::<Vec<_>>(), vec!["Account"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].container, "/no/such/models");
        assert_eq!(outcome.containers_loaded, 1);
        assert!(!outcome.all_failed());
    }

    #[test]
    fn extract_all_reports_total_failure() {
        let outcome = SchemaExtractor::default().extract_all(&["registry:ghost".to_string()]);

        assert!(outcome.schemas.is_empty());
        assert!(outcome.all_failed());
    }

    #[test]
    fn failing_model_keeps_its_siblings() {
        let container = Fixed {
            schemas: vec![
                ("User".to_string(), user_schema()),
                ("Pair".to_string(), json!({"type": "object"})),
            ],
            broken: Some("Pair".to_string()),
        };
        let extractor = SchemaExtractor::default();
        let mut outcome = ExtractionOutcome::default();

        extractor.extract_container(&container, &mut outcome);

        assert_eq!(outcome.schemas.names().collect::<Vec<_>>(), vec!["User"]);
        assert_eq!(outcome.containers_loaded, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].container, "fixed");
        assert!(matches!(&outcome.failures[0].error, Error::Extraction { model, .. } if model == "Pair"));
        assert!(!outcome.all_failed());
    }

    #[test]
    fn no_containers_is_not_a_failure() {
        let outcome = SchemaExtractor::default().extract_all(&[]);
        assert!(!outcome.all_failed());
    }
}
