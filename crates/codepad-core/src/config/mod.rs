//! Configuration module
//!
//! YAML configuration for the execution service and the server that hosts
//! it, with `CODEPAD_*` environment overrides.

pub mod types;
pub mod loader;

pub use types::*;
pub use loader::*;

#[cfg(test)]
mod tests;

use crate::errors::CodepadError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<CodepadConfig, CodepadError> {
    ConfigLoader::from_file(path).await
}

/// Validate a configuration
pub fn validate_config(config: &CodepadConfig) -> Result<(), CodepadError> {
    config.validate()
}
