//! Model containers
//!
//! A model container is anything that can list the models it exposes and
//! introspect each one into a JSON-Schema value. The extractor only talks to
//! containers through [`ModelContainer`]; [`ContainerCatalog`] turns the
//! identifiers given on the command line or in the config into containers.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::config::ModelsConfig;
use crate::error::{Error, Result};
use crate::models::json::JsonSchemaContainer;
use crate::models::registry::ModelRegistry;
use crate::models::source::SourceContainer;

/// Output of introspecting one model
#[derive(Debug, Clone, PartialEq)]
pub struct RawSchema {
    pub name: String,
    pub module_path: String,
    pub schema: serde_json::Value,
}

/// Source of model schemas
pub trait ModelContainer {
    /// Identifier of this container, used in metadata and logs
    fn path(&self) -> &str;

    /// Models exposed by this container, in a stable order
    fn models(&self) -> Result<Vec<String>>;

    /// Introspect a single model
    fn get_schema(&self, model: &str) -> Result<RawSchema>;
}

/// Resolves container identifiers into containers
///
/// Identifiers are interpreted as:
/// - `registry:<name>` or a bare registered name: an in-process [`ModelRegistry`]
/// - `json:<path>`: JSON Schema files
/// - `rust:<path>`: Rust sources
/// - a path ending in `.json`: JSON Schema files
/// - any other path (file or directory): Rust sources
///
/// Paths containing glob metacharacters expand to one container per match.
#[derive(Clone, Default)]
pub struct ContainerCatalog {
    config: ModelsConfig,
    registries: IndexMap<String, ModelRegistry>,
}

enum ContainerKind {
    Json,
    Rust,
}

impl ContainerCatalog {
    /// Create a catalog using the given discovery settings
    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            config: config.clone(),
            registries: IndexMap::new(),
        }
    }

    /// Make an in-process registry resolvable by its name
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registries.insert(registry.name().to_string(), registry);
        self
    }

    /// Resolve one identifier into its containers
    pub fn resolve(&self, identifier: &str) -> Result<Vec<Box<dyn ModelContainer>>> {
        if let Some(name) = identifier.strip_prefix("registry:") {
            return self.registry(name).map(|r| vec![r]);
        }
        if self.registries.contains_key(identifier) {
            return self.registry(identifier).map(|r| vec![r]);
        }

        let (kind, path) = if let Some(path) = identifier.strip_prefix("json:") {
            (Some(ContainerKind::Json), path)
        } else if let Some(path) = identifier.strip_prefix("rust:") {
            (Some(ContainerKind::Rust), path)
        } else {
            (None, identifier)
        };

        self.expand(path)?
            .into_iter()
            .map(|path| self.open(&path, kind.as_ref()))
            .collect()
    }

    fn registry(&self, name: &str) -> Result<Box<dyn ModelContainer>> {
        self.registries
            .get(name)
            .map(|registry| Box::new(registry.clone()) as Box<dyn ModelContainer>)
            .ok_or_else(|| Error::Container(format!("No model registry named '{}'", name)))
    }

    fn expand(&self, path: &str) -> Result<Vec<PathBuf>> {
        if !path.contains(&['*', '?', '['][..]) {
            return Ok(vec![PathBuf::from(path)]);
        }

        let mut matches = Vec::new();
        for entry in glob::glob(path)? {
            matches.push(entry.map_err(|e| Error::Container(e.to_string()))?);
        }

        if matches.is_empty() {
            return Err(Error::Container(format!("Pattern '{}' matched nothing", path)));
        }
        Ok(matches)
    }

    fn open(&self, path: &Path, kind: Option<&ContainerKind>) -> Result<Box<dyn ModelContainer>> {
        let is_json = match kind {
            Some(ContainerKind::Json) => true,
            Some(ContainerKind::Rust) => false,
            None => path.extension().map_or(false, |ext| ext == "json"),
        };

        if is_json {
            Ok(Box::new(JsonSchemaContainer::open(path, &self.config)?))
        } else {
            Ok(Box::new(SourceContainer::open(path, &self.config)?))
        }
    }
}
