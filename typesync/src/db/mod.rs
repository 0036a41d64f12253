//! Database module for typesync
//!
//! This module handles database connections and the pre-flight table check.

pub mod connection;
pub mod preflight;

// Re-export key types
pub use connection::DatabaseConnection;
pub use preflight::validate_schema;
