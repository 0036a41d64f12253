//! Models module for typesync
//!
//! This module handles model discovery and introspection.

pub mod container;
pub mod json;
pub mod registry;
pub mod rust_types;
pub mod source;

// Re-export key types
pub use container::{ContainerCatalog, ModelContainer, RawSchema};
pub use json::JsonSchemaContainer;
pub use registry::{ModelRegistry, TypeSyncEnum, TypeSyncModel};
pub use rust_types::{EnumDescriptor, FieldDescriptor, ModelDescriptor};
pub use source::SourceContainer;
