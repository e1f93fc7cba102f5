//! Error types for the code execution core
//!
//! Two hierarchies live here. `ExecutionError` describes why a single run or
//! syntax check of user code failed and is folded into the result shape by the
//! orchestrator. `CodepadError` covers wiring concerns such as configuration
//! loading, where failing loudly at startup is the right outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CodepadError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CodepadError {
    fn from(err: std::io::Error) -> Self {
        CodepadError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for CodepadError {
    fn from(err: reqwest::Error) -> Self {
        CodepadError::ConfigError(err.to_string())
    }
}

/// Failure kinds surfaced in an execution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnsupportedLanguage,
    SpawnFailure,
    NonZeroExit,
    Timeout,
}

// Specific error for running interpreters
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Language {0} is not supported")]
    UnsupportedLanguage(String),
    #[error("Failed to start '{program}': {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{}", non_zero_exit_message(.code, .stderr))]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("Code execution timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("Could not prepare scratch file: {0}")]
    ScratchFile(#[from] std::io::Error),
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            ExecutionError::SpawnFailure { .. } | ExecutionError::ScratchFile(_) => {
                ErrorKind::SpawnFailure
            }
            ExecutionError::NonZeroExit { .. } => ErrorKind::NonZeroExit,
            ExecutionError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::Timeout { .. })
    }
}

fn non_zero_exit_message(code: &Option<i32>, stderr: &str) -> String {
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("Process exited with code {}", code),
        None => "Process terminated by signal".to_string(),
    }
}
