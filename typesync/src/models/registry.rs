//! Model registry for typesync
//!
//! This module manages in-process registration of model types deriving
//! `TypeSync`.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::models::container::{ModelContainer, RawSchema};
use crate::models::rust_types::{
    enum_catalog, model_schema, EnumCatalog, EnumDescriptor, ModelDescriptor,
};

/// A struct that can be synchronized as a TypeScript interface
///
/// Implemented by `#[derive(TypeSync)]` on structs with named fields.
pub trait TypeSyncModel {
    /// Describe the struct's name, fields and attributes
    fn describe() -> ModelDescriptor;
}

/// A unit-only enum that serializes as a string
///
/// Implemented by `#[derive(TypeSync)]` on enums without data.
pub trait TypeSyncEnum {
    /// Describe the enum's variants and attributes
    fn describe() -> EnumDescriptor;
}

/// Registry for typesync models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    name: String,
    models: IndexMap<String, ModelDescriptor>,
    enums: Vec<EnumDescriptor>,
}

impl ModelRegistry {
    /// Create an empty registry resolvable under `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            models: IndexMap::new(),
            enums: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a model type
    pub fn register<T: TypeSyncModel>(&mut self) -> &mut Self {
        let descriptor = T::describe();
        tracing::trace!(registry = %self.name, model = %descriptor.name, "Registered model");
        self.models.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Register a string enum so fields of that type become literal unions
    pub fn register_enum<T: TypeSyncEnum>(&mut self) -> &mut Self {
        self.enums.push(T::describe());
        self
    }

    /// Get a specific model by name
    pub fn get_model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.get(name)
    }

    fn catalog(&self) -> EnumCatalog {
        enum_catalog(&self.enums)
    }
}

impl ModelContainer for ModelRegistry {
    fn path(&self) -> &str {
        &self.name
    }

    fn models(&self) -> Result<Vec<String>> {
        Ok(self.models.keys().cloned().collect())
    }

    fn get_schema(&self, model: &str) -> Result<RawSchema> {
        let descriptor = self.get_model(model).ok_or_else(|| {
            Error::Container(format!("Model '{}' is not registered in '{}'", model, self.name))
        })?;

        Ok(RawSchema {
            name: descriptor.name.clone(),
            module_path: descriptor.module_path.clone(),
            schema: model_schema(descriptor, &self.catalog()),
        })
    }
}
