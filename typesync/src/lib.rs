//! typesync: keeps TypeScript declarations in sync with Rust data models
//!
//! typesync extracts JSON-Schema shapes from your models, compares them with
//! the previous run to catch breaking changes, and regenerates a TypeScript
//! declaration file when the changes are allowed by the validation policy.

// Lets `#[derive(TypeSync)]` expand to `::typesync::...` inside this crate too
extern crate self as typesync;

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;
pub mod snapshot;
pub mod sync;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use db::connection::DatabaseConnection;
pub use error::{Error, Result};
pub use models::container::{ContainerCatalog, ModelContainer};
pub use models::registry::{ModelRegistry, TypeSyncEnum, TypeSyncModel};
pub use schema::diff::SchemaValidator;
pub use schema::extractor::SchemaExtractor;
pub use schema::generator::TypeScriptGenerator;
pub use schema::types::{ChangeRecord, SchemaSet, ValidationLevel};
pub use snapshot::{JsonFileSnapshotStore, SnapshotStore};
pub use sync::{SchemaSynchronizer, SyncReport, SyncState};
pub use typesync_macros::TypeSync;

/// Build a synchronizer from the specified configuration file
pub fn init(config_path: &str) -> Result<SchemaSynchronizer> {
    let config = config::load_from_file(config_path)?;
    Ok(from_config(&config))
}

/// Build a synchronizer from an already loaded configuration
pub fn from_config(config: &Config) -> SchemaSynchronizer {
    let catalog = ContainerCatalog::new(&config.models);
    SchemaSynchronizer::from_config(config, catalog)
}
