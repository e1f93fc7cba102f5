//! Configuration loader for YAML files and environment overrides
//!
//! This module handles loading configuration from YAML files or URLs and
//! applying `CODEPAD_*` environment variables on top of the parsed values.

use crate::config::types::*;
use crate::errors::CodepadError;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const ENV_SCRATCH_DIR: &str = "CODEPAD_SCRATCH_DIR";
pub const ENV_TIMEOUT_MS: &str = "CODEPAD_TIMEOUT_MS";
pub const ENV_BIND_ADDR: &str = "CODEPAD_BIND_ADDR";
pub const ENV_LOG_LEVEL: &str = "CODEPAD_LOG_LEVEL";

/// Configuration loader with environment resolution
pub struct ConfigLoader;
impl ConfigLoader {
    /// Load configuration from a source (file path or URL)
    pub async fn from_source(source: &str) -> Result<CodepadConfig, CodepadError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::from_url(source).await
        } else {
            Self::from_file(source).await
        }
    }

    /// Load configuration from a URL
    pub async fn from_url(url: &str) -> Result<CodepadConfig, CodepadError> {
        let client = reqwest::Client::new();
        let response = client.get(url).send().await.map_err(|e| {
            CodepadError::ConfigError(format!(
                "Failed to fetch configuration from URL {}: {}",
                url, e
            ))
        })?;

        if !response.status().is_success() {
            return Err(CodepadError::ConfigError(format!(
                "Failed to fetch configuration: HTTP {} from URL {}",
                response.status(),
                url
            )));
        }

        let content = response.text().await.map_err(|e| {
            CodepadError::ConfigError(format!(
                "Failed to read configuration response from URL {}: {}",
                url, e
            ))
        })?;

        Self::from_str(&content, None)
    }

    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<CodepadConfig, CodepadError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            CodepadError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content, path.parent())
    }

    /// Load configuration from a YAML string. A relative `scratch_dir` is
    /// resolved against `base_dir` when one is given.
    pub fn from_str(content: &str, base_dir: Option<&Path>) -> Result<CodepadConfig, CodepadError> {
        let mut config: CodepadConfig = if content.trim().is_empty() {
            CodepadConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                CodepadError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        Self::resolve_environment(&mut config)?;

        if let Some(base_dir) = base_dir {
            if config.execution.scratch_dir.is_relative() {
                config.execution.scratch_dir = base_dir.join(&config.execution.scratch_dir);
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<CodepadConfig, CodepadError> {
        let mut config = CodepadConfig::default();
        Self::resolve_environment(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_environment(config: &mut CodepadConfig) -> Result<(), CodepadError> {
        if let Some(dir) = non_empty_var(ENV_SCRATCH_DIR) {
            config.execution.scratch_dir = PathBuf::from(dir);
        }

        if let Some(timeout) = non_empty_var(ENV_TIMEOUT_MS) {
            config.execution.timeout_ms = timeout.parse().map_err(|e| {
                CodepadError::ConfigError(format!(
                    "{} must be a number of milliseconds, got '{}': {}",
                    ENV_TIMEOUT_MS, timeout, e
                ))
            })?;
        }

        if let Some(addr) = non_empty_var(ENV_BIND_ADDR) {
            config.server.bind_addr = addr;
        }

        if let Some(level) = non_empty_var(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }

        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
