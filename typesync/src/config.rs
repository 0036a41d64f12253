//! Configuration handling for typesync

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::schema::types::ValidationLevel;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "typesync.toml";

/// Default location of the generated declarations
pub const DEFAULT_OUTPUT_PATH: &str = "frontend/types/schemas.ts";

/// File name of the snapshot kept next to the generated declarations
pub const DEFAULT_SNAPSHOT_FILE: &str = ".typesync-snapshot.json";

/// Load configuration from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete typesync configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub models: ModelsConfig,
    pub output: OutputConfig,
    pub validation: ValidationConfig,
    pub logging: Option<LoggingConfig>,
    pub database: Option<DatabaseConfig>,
}

/// Model discovery configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ModelsConfig {
    /// Container identifiers to extract from
    pub containers: Vec<String>,
    /// Regex patterns matched against a struct's attributes (without `#[ ]`)
    /// to recognise it as a model in Rust sources
    pub attributes: Vec<String>,
    pub recursive_scan: bool,
    pub exclude_paths: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            containers: vec!["src/models".to_string()],
            attributes: vec![r"derive\(.*\bTypeSync\b.*\)".to_string()],
            recursive_scan: true,
            exclude_paths: Vec::new(),
        }
    }
}

/// Generated output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub snapshot_path: Option<PathBuf>,
    pub tool_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            snapshot_path: None,
            tool_name: "typesync".to_string(),
        }
    }
}

impl OutputConfig {
    /// Snapshot location, defaulting to a hidden file beside the output
    pub fn resolved_snapshot_path(&self) -> PathBuf {
        match &self.snapshot_path {
            Some(path) => path.clone(),
            None => self
                .path
                .parent()
                .map(|dir| dir.join(DEFAULT_SNAPSHOT_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE)),
        }
    }
}

/// Breaking-change policy configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ValidationConfig {
    pub level: ValidationLevel,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}

/// Database connection used by the pre-flight table check
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub expected_tables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.models.containers, vec!["src/models".to_string()]);
        assert_eq!(config.models.attributes, vec![r"derive\(.*\bTypeSync\b.*\)".to_string()]);
        assert_eq!(config.output.path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.validation.level, ValidationLevel::Moderate);
        assert!(config.database.is_none());
    }

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [models]
            containers = ["src/api/models.rs", "json:schemas"]
            attributes = ["typesync"]
            recursive_scan = false

            [output]
            path = "web/types/api.ts"
            tool_name = "api-types"

            [validation]
            level = "strict"

            [logging]
            level = "debug"
            format = "json"

            [database]
            driver = "sqlite"
            url = "sqlite::memory:"
            expected_tables = ["users"]
            "#,
        )
        .unwrap();

        assert_eq!(config.models.containers.len(), 2);
        assert!(!config.models.recursive_scan);
        assert_eq!(config.validation.level, ValidationLevel::Strict);
        assert_eq!(config.output.tool_name, "api-types");
        assert_eq!(
            config.output.resolved_snapshot_path(),
            PathBuf::from("web/types").join(DEFAULT_SNAPSHOT_FILE)
        );
        assert_eq!(config.logging.unwrap().format, "json");
        assert_eq!(config.database.unwrap().expected_tables, vec!["users".to_string()]);
    }

    #[test]
    fn rejects_unknown_validation_level() {
        let result: std::result::Result<Config, _> = toml::from_str("[validation]\nlevel = \"paranoid\"");
        assert!(result.is_err());
    }
}
