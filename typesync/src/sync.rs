//! Schema synchronizer
//!
//! Orchestrates one pipeline run: load the previous snapshot, extract the
//! current schemas, diff and gate them, then write the declarations and the
//! new snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::container::ContainerCatalog;
use crate::schema::diff::SchemaValidator;
use crate::schema::extractor::SchemaExtractor;
use crate::schema::generator::TypeScriptGenerator;
use crate::schema::types::{ChangeRecord, SchemaSet, ValidationLevel};
use crate::snapshot::{JsonFileSnapshotStore, SnapshotStore};
use crate::utils::fs::write_atomic;

/// Stage of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Extracting,
    Validating,
    Blocked,
    Generating,
    Writing,
    Done,
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::Extracting => "extracting",
            SyncState::Validating => "validating",
            SyncState::Blocked => "blocked",
            SyncState::Generating => "generating",
            SyncState::Writing => "writing",
            SyncState::Done => "done",
            SyncState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Outcome of one sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub timestamp: DateTime<Utc>,
    pub schemas_processed: usize,
    pub changes: Vec<ChangeRecord>,
    pub validation_errors: Vec<String>,
    pub generated_files: Vec<String>,
    pub success: bool,
}

impl SyncReport {
    fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            schemas_processed: 0,
            changes: Vec::new(),
            validation_errors: Vec::new(),
            generated_files: Vec::new(),
            success: false,
        }
    }
}

/// Runs the extract, validate, generate and write pipeline
pub struct SchemaSynchronizer {
    extractor: SchemaExtractor,
    validator: SchemaValidator,
    generator: TypeScriptGenerator,
    store: Box<dyn SnapshotStore>,
    containers: Vec<String>,
    output_path: PathBuf,
    state: SyncState,
}

impl SchemaSynchronizer {
    /// Create a synchronizer with a moderate policy and a snapshot beside the output
    pub fn new(extractor: SchemaExtractor, containers: Vec<String>, output_path: impl Into<PathBuf>) -> Self {
        let output_path = output_path.into();
        let snapshot_path = crate::config::OutputConfig {
            path: output_path.clone(),
            ..Default::default()
        }
        .resolved_snapshot_path();

        Self {
            extractor,
            validator: SchemaValidator::default(),
            generator: TypeScriptGenerator::new(),
            store: Box::new(JsonFileSnapshotStore::new(snapshot_path)),
            containers,
            output_path,
            state: SyncState::Idle,
        }
    }

    /// Build a synchronizer from a loaded configuration
    pub fn from_config(config: &Config, catalog: ContainerCatalog) -> Self {
        Self::new(
            SchemaExtractor::new(catalog),
            config.models.containers.clone(),
            config.output.path.clone(),
        )
        .with_validation_level(config.validation.level)
        .with_generator(TypeScriptGenerator::new().with_tool_name(config.output.tool_name.clone()))
        .with_snapshot_store(JsonFileSnapshotStore::new(config.output.resolved_snapshot_path()))
    }

    pub fn with_validation_level(mut self, level: ValidationLevel) -> Self {
        self.validator = SchemaValidator::new(level);
        self
    }

    pub fn with_generator(mut self, generator: TypeScriptGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_snapshot_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Run the pipeline once
    ///
    /// Breaking changes block generation unless `force` is set; a blocked run
    /// returns a report with `success == false` and writes nothing.
    pub fn sync(&mut self, force: bool) -> Result<SyncReport> {
        match self.run(force) {
            Ok(report) => Ok(report),
            Err((stage, error)) => {
                self.transition(SyncState::Error);
                tracing::error!(stage, error = %error, "Schema sync failed");
                Err(Error::service(stage, error))
            }
        }
    }

    fn run(&mut self, force: bool) -> std::result::Result<SyncReport, (&'static str, Error)> {
        let mut report = SyncReport::new();
        self.transition(SyncState::Idle);

        let previous = self
            .store
            .load()
            .map_err(|e| ("loading the snapshot", e))?
            .unwrap_or_default();

        self.transition(SyncState::Extracting);
        let outcome = self.extractor.extract_all(&self.containers);
        if outcome.all_failed() {
            return Err((
                "extracting schemas",
                Error::Container(format!(
                    "none of the {} configured containers could be loaded",
                    self.containers.len()
                )),
            ));
        }
        let current = outcome.schemas;
        report.schemas_processed = current.len();

        self.transition(SyncState::Validating);
        report.changes = self.validator.diff(&previous, &current);
        let breaking = self.validator.breaking_changes(&report.changes);
        tracing::info!(
            changes = report.changes.len(),
            breaking = breaking.len(),
            level = %self.validator.level(),
            "Compared schemas against snapshot"
        );

        if !breaking.is_empty() {
            if !force {
                report.validation_errors = breaking
                    .iter()
                    .map(|change| format!("Breaking change in {}: {}", change.schema_name, change.description))
                    .collect();
                self.transition(SyncState::Blocked);
                tracing::warn!(
                    breaking = report.validation_errors.len(),
                    "Breaking changes detected, nothing written (use --force to override)"
                );
                return Ok(report);
            }

            for change in &breaking {
                tracing::warn!(schema = %change.schema_name, change = %change.description, "Forcing breaking change");
            }
        }

        self.transition(SyncState::Generating);
        let contents = self
            .generator
            .generate_file(&current)
            .map_err(|e| ("generating declarations", e))?;

        self.transition(SyncState::Writing);
        self.write(&current, &contents)?;

        report.generated_files.push(self.output_path.display().to_string());
        report.success = true;
        self.transition(SyncState::Done);

        tracing::info!(
            output = %self.output_path.display(),
            schemas = report.schemas_processed,
            "Schema sync completed"
        );
        Ok(report)
    }

    fn write(&self, schemas: &SchemaSet, contents: &str) -> std::result::Result<(), (&'static str, Error)> {
        write_atomic(&self.output_path, contents.as_bytes()).map_err(|e| ("writing declarations", e))?;
        self.store.save(schemas).map_err(|e| ("saving the snapshot", e))
    }

    fn transition(&mut self, next: SyncState) {
        tracing::debug!(from = %self.state, to = %next, "Sync state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::{ModelRegistry, TypeSyncModel};
    use crate::models::rust_types::{FieldDescriptor, ModelDescriptor};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct MemoryStore {
        schemas: Rc<RefCell<Option<SchemaSet>>>,
    }

    impl SnapshotStore for MemoryStore {
        fn load(&self) -> Result<Option<SchemaSet>> {
            Ok(self.schemas.borrow().clone())
        }

        fn save(&self, schemas: &SchemaSet) -> Result<()> {
            *self.schemas.borrow_mut() = Some(schemas.clone());
            Ok(())
        }
    }

    struct Invoice;

    impl TypeSyncModel for Invoice {
        fn describe() -> ModelDescriptor {
            ModelDescriptor {
                name: "Invoice".to_string(),
                module_path: "billing".to_string(),
                attributes: vec![],
                fields: vec![FieldDescriptor {
                    name: "total".to_string(),
                    rust_type: "f64".to_string(),
                    docs: vec![],
                    attributes: vec![],
                }],
            }
        }
    }

    fn extractor() -> SchemaExtractor {
        let mut registry = ModelRegistry::new("billing");
        registry.register::<Invoice>();
        SchemaExtractor::new(ContainerCatalog::default().with_registry(registry))
    }

    #[test]
    fn first_run_generates_and_saves_snapshot() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("types/schemas.ts");
        let store = MemoryStore::default();

        let mut synchronizer = SchemaSynchronizer::new(extractor(), vec!["billing".to_string()], &output)
            .with_snapshot_store(store.clone());
        let report = synchronizer.sync(false).unwrap();

        assert!(report.success);
        assert_eq!(report.schemas_processed, 1);
        assert_eq!(report.generated_files, vec![output.display().to_string()]);
        assert_eq!(synchronizer.state(), SyncState::Done);
        assert!(std::fs::read_to_string(&output).unwrap().contains("export interface Invoice {"));
        assert!(store.schemas.borrow().as_ref().unwrap().contains("Invoice"));
    }

    #[test]
    fn blocked_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("schemas.ts");
        let store = MemoryStore::default();
        *store.schemas.borrow_mut() = Some(
            vec![crate::schema::types::SchemaDocument::new("Legacy")]
                .into_iter()
                .collect(),
        );

        let mut synchronizer = SchemaSynchronizer::new(extractor(), vec!["billing".to_string()], &output)
            .with_snapshot_store(store.clone());
        let report = synchronizer.sync(false).unwrap();

        assert!(!report.success);
        assert_eq!(synchronizer.state(), SyncState::Blocked);
        assert_eq!(
            report.validation_errors,
            vec!["Breaking change in Legacy: Schema 'Legacy' was removed".to_string()]
        );
        assert!(!output.exists());
        assert!(store.schemas.borrow().as_ref().unwrap().contains("Legacy"));
    }

    #[test]
    fn total_extraction_failure_is_a_service_error() {
        let dir = tempdir().unwrap();
        let mut synchronizer = SchemaSynchronizer::new(
            SchemaExtractor::default(),
            vec!["registry:missing".to_string()],
            dir.path().join("schemas.ts"),
        )
        .with_snapshot_store(MemoryStore::default());

        let error = synchronizer.sync(false).unwrap_err();
        assert!(matches!(error, Error::Service { .. }));
        assert!(error.to_string().contains("extracting schemas"));
        assert_eq!(synchronizer.state(), SyncState::Error);
    }

    #[test]
    fn default_snapshot_sits_beside_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("schemas.ts");

        let mut synchronizer = SchemaSynchronizer::new(extractor(), vec!["billing".to_string()], &output);
        synchronizer.sync(false).unwrap();

        assert!(dir.path().join(crate::config::DEFAULT_SNAPSHOT_FILE).exists());
    }
}
