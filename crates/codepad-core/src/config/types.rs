//! Configuration type definitions
//!
//! Every field carries a serde default, so an empty YAML document yields a
//! working configuration. Sections mirror the parts of the system they feed:
//! the execution service, the HTTP server, the history store and logging.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::CodepadError;
use crate::executors::language::LanguageTable;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodepadConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Wall-clock limit for one run, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Per-language interpreter overrides, keyed by any accepted alias.
    #[serde(default)]
    pub languages: HashMap<String, LanguageOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageOverride {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub run_args: Option<Vec<String>>,
    #[serde(default)]
    pub check_args: Option<Vec<String>>,
    #[serde(default)]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of records kept before the oldest are evicted.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_scratch_dir() -> PathBuf { std::env::temp_dir().join("code-execution") }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_bind_addr() -> String { "127.0.0.1:3001".to_string() }
fn default_true() -> bool { true }
fn default_max_body_size() -> usize { 1024 * 1024 }
fn default_history_capacity() -> usize { 1000 }
fn default_history_limit() -> usize { 50 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            timeout_ms: default_timeout_ms(),
            languages: HashMap::new(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_cors: true,
            cors_origins: None,
            max_body_size: default_max_body_size(),
            enable_logging: true,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            default_limit: default_history_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolves the configured overrides into a dispatch table.
    pub fn language_table(&self) -> Result<LanguageTable, CodepadError> {
        LanguageTable::from_overrides(&self.languages)
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, CodepadError> {
        self.bind_addr.parse().map_err(|e| {
            CodepadError::ConfigError(format!(
                "Invalid bind address '{}': {}",
                self.bind_addr, e
            ))
        })
    }
}

impl CodepadConfig {
    pub fn validate(&self) -> Result<(), CodepadError> {
        if self.execution.timeout_ms == 0 {
            return Err(CodepadError::ConfigError(
                "execution.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.execution.scratch_dir.as_os_str().is_empty() {
            return Err(CodepadError::ConfigError(
                "execution.scratch_dir cannot be empty".to_string(),
            ));
        }

        for (name, language_override) in &self.execution.languages {
            if let Some(program) = &language_override.program {
                if program.trim().is_empty() {
                    return Err(CodepadError::ConfigError(format!(
                        "Interpreter program for '{}' cannot be empty",
                        name
                    )));
                }
            }
        }
        self.execution.language_table()?;

        if self.history.capacity == 0 {
            return Err(CodepadError::ConfigError(
                "history.capacity must be greater than 0".to_string(),
            ));
        }

        if self.server.max_body_size == 0 {
            return Err(CodepadError::ConfigError(
                "server.max_body_size must be greater than 0".to_string(),
            ));
        }

        self.server.socket_addr()?;

        if self.logging.level.parse::<log::LevelFilter>().is_err() {
            return Err(CodepadError::ConfigError(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }
}
