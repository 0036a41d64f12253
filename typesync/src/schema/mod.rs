//! Schema module for typesync
//!
//! This module handles schema extraction, comparison and TypeScript generation.

pub mod diff;
pub mod extractor;
pub mod generator;
pub mod types;

// Re-export key types
pub use diff::SchemaValidator;
pub use extractor::{ContainerFailure, ExtractionOutcome, SchemaExtractor};
pub use generator::{EnumDeclaration, TypeScriptGenerator};
pub use types::{
    ChangeRecord, ChangeType, FieldSchema, FieldType, SchemaDocument, SchemaMetadata, SchemaSet,
    ValidationLevel,
};
