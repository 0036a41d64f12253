//! Snapshot persistence
//!
//! The last successfully generated schema set is kept on disk so the next run
//! has a baseline to diff against.
//!
//! ## Format
//!
//! ```json
//! { "version": 1, "saved_at": "2024-01-01T00:00:00Z", "schemas": { ... } }
//! ```
//!
//! Files are written to a temporary file in the same directory first, then
//! renamed over the target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::schema::types::SchemaSet;
use crate::utils::fs::write_atomic;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Storage for the previous schema set
pub trait SnapshotStore {
    /// Load the stored schema set, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<SchemaSet>>;

    /// Replace the stored schema set
    fn save(&self, schemas: &SchemaSet) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    /// Format version for compatibility checking
    version: u32,
    saved_at: DateTime<Utc>,
    schemas: SchemaSet,
}

/// Snapshot kept as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<SchemaSet>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No snapshot found, starting from an empty baseline");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;

        let version = raw.get("version").and_then(serde_json::Value::as_u64);
        if version != Some(u64::from(SNAPSHOT_VERSION)) {
            return Err(Error::Serialization(format!(
                "Unsupported snapshot version {:?} in {} (expected {})",
                version,
                self.path.display(),
                SNAPSHOT_VERSION
            )));
        }

        let snapshot: SnapshotFile = serde_json::from_value(raw)?;
        tracing::debug!(
            path = %self.path.display(),
            schemas = snapshot.schemas.len(),
            saved_at = %snapshot.saved_at,
            "Loaded snapshot"
        );

        Ok(Some(snapshot.schemas))
    }

    fn save(&self, schemas: &SchemaSet) -> Result<()> {
        let snapshot = SnapshotFile {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            schemas: schemas.clone(),
        };

        let content = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(&self.path, content.as_bytes())?;

        tracing::debug!(path = %self.path.display(), schemas = schemas.len(), "Saved snapshot");
        Ok(())
    }
}
