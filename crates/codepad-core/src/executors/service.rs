// src/executors/service.rs
use async_trait::async_trait;
use std::time::{Duration, Instant};

use super::language::{Language, LanguageSpec, LanguageTable};
use super::process::{ProcessOutput, ProcessRunner};
use super::scratch::ScratchDir;
use super::validator::Validator;
use super::{CodeExecutor, ExecutionRequest, ExecutionResult, ValidationResult};
use crate::config::types::ExecutionConfig;
use crate::errors::{CodepadError, ExecutionError};

/// Facade over scratch files, language dispatch and the process runner.
///
/// Constructed explicitly by whoever wires up the application; there is no
/// shared global instance. Requests share nothing but the scratch
/// directory, so any number may run at once.
#[derive(Debug, Clone)]
pub struct CodeExecutionService {
    scratch: ScratchDir,
    languages: LanguageTable,
    runner: ProcessRunner,
    timeout: Duration,
    validator: Validator,
}

impl CodeExecutionService {
    pub fn new(config: &ExecutionConfig) -> Result<Self, CodepadError> {
        let languages = config.language_table()?;
        Self::with_parts(config.scratch_dir.clone(), languages, config.timeout())
    }

    pub fn with_parts(
        scratch_dir: impl Into<std::path::PathBuf>,
        languages: LanguageTable,
        timeout: Duration,
    ) -> Result<Self, CodepadError> {
        let scratch_dir = scratch_dir.into();
        let scratch = ScratchDir::create(&scratch_dir).map_err(|e| {
            CodepadError::IoError(format!(
                "Failed to create scratch directory {}: {}",
                scratch_dir.display(),
                e
            ))
        })?;
        let runner = ProcessRunner::new();
        let validator = Validator::new(scratch.clone(), languages.clone(), runner, timeout);

        log::info!(
            "Code execution service ready (scratch dir {}, timeout {} ms)",
            scratch.path().display(),
            timeout.as_millis()
        );

        Ok(Self {
            scratch,
            languages,
            runner,
            timeout,
            validator,
        })
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, request: &ExecutionRequest) -> Result<ProcessOutput, ExecutionError> {
        let language = Language::parse(&request.language)
            .ok_or_else(|| ExecutionError::UnsupportedLanguage(request.language.clone()))?;
        let spec: &LanguageSpec = self.languages.get(language);

        let scratch = self.scratch.acquire(&spec.extension, &request.code).await?;
        let args = spec.run_args_for(scratch.path());
        let outcome = self.runner.run(&spec.program, &args, self.timeout).await;
        scratch.release().await;
        outcome
    }
}

#[async_trait]
impl CodeExecutor for CodeExecutionService {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let start = Instant::now();
        let outcome = self.run(&request).await;
        let execution_time = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => ExecutionResult {
                output: Some(output.stdout),
                error: (!output.stderr.is_empty()).then_some(output.stderr),
                error_kind: None,
                execution_time,
            },
            Err(e) => {
                log::info!(
                    "Execution of {} code failed after {} ms: {}",
                    request.language,
                    execution_time,
                    e
                );
                ExecutionResult {
                    output: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                    execution_time,
                }
            }
        }
    }

    async fn validate(&self, code: &str, language: &str) -> ValidationResult {
        self.validator.validate(code, language).await
    }
}
