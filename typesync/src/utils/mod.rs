//! Utilities for typesync
//!
//! This module provides utility functions used across the library.

pub mod fs;
pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use fs::write_atomic;
pub use naming::{apply_naming_convention, format_property_key, title_case};
