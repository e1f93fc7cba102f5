//! Core of the Codepad coding platform: running user-submitted code.
//!
//! This crate takes source text from a caller, writes it to a scratch file
//! and runs it with the host's interpreter under a wall-clock timeout. It
//! captures stdout and stderr and always removes the scratch file afterwards.
//!
//! # Architecture Overview
//!
//! - **Executors**: scratch files, language dispatch, the process runner,
//!   syntax validation and the `CodeExecutionService` facade
//! - **History**: bounded record of past executions
//! - **Configuration system**: YAML configuration with environment overrides

pub mod config;
pub mod errors;
pub mod executors;
pub mod history;

pub use config::*;
pub use errors::{CodepadError, ErrorKind, ExecutionError};
pub use executors::{
    CodeExecutionService, CodeExecutor, ExecutionRequest, ExecutionResult, Language,
    ValidationResult,
};
pub use history::{ExecutionHistory, ExecutionRecord, InMemoryHistory};
