//! Error types for typesync

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for typesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for typesync
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to extract schema for model '{model}': {source} [{context}]")]
    Extraction {
        model: String,
        #[source]
        source: Box<Error>,
        context: ErrorContext,
    },

    #[error("Failed to generate declarations for schema '{schema}': {message}")]
    Generation { schema: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schema sync failed while {message}: {source} [{context}]")]
    Service {
        message: String,
        #[source]
        source: Box<Error>,
        context: ErrorContext,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model container error: {0}")]
    Container(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl Error {
    /// Wrap a provider failure for a single model
    pub fn extraction(model: impl Into<String>, source: Error) -> Self {
        Error::Extraction {
            model: model.into(),
            source: Box::new(source),
            context: ErrorContext::capture(),
        }
    }

    /// Wrap a failure that aborted a sync run
    pub fn service(message: impl Into<String>, source: Error) -> Self {
        Error::Service {
            message: message.into(),
            source: Box::new(source),
            context: ErrorContext::capture(),
        }
    }

    /// Ambient context attached to the error, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Extraction { context, .. } | Error::Service { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Process and environment snapshot taken when an error is raised
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: DateTime<Utc>,
    pub process_id: u32,
    pub working_dir: Option<PathBuf>,
    pub os: &'static str,
    pub arch: &'static str,
    pub version: &'static str,
}

impl ErrorContext {
    /// Capture the current process context
    pub fn capture() -> Self {
        Self {
            timestamp: Utc::now(),
            process_id: std::process::id(),
            working_dir: std::env::current_dir().ok(),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {} pid={} os={}/{} typesync={}",
            self.timestamp.to_rfc3339(),
            self.process_id,
            self.os,
            self.arch,
            self.version
        )?;

        if let Some(dir) = &self.working_dir {
            write!(f, " cwd={}", dir.display())?;
        }

        Ok(())
    }
}

/// Convert Serde JSON errors to typesync errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serialization(error.to_string())
    }
}

/// Convert TOML deserialization errors to typesync errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error.to_string())
    }
}

/// Convert invalid container glob patterns to typesync errors
impl From<glob::PatternError> for Error {
    fn from(error: glob::PatternError) -> Self {
        Error::Container(format!("Invalid container pattern: {}", error))
    }
}
