// src/executors/validator.rs
use std::time::Duration;

use super::language::{LanguageSpec, LanguageTable};
use super::process::ProcessRunner;
use super::scratch::ScratchDir;
use super::ValidationResult;
use crate::errors::ExecutionError;

/// Syntax-only checks through each interpreter's compile mode. The program
/// itself never runs, so runtime and semantic errors go unreported.
#[derive(Debug, Clone)]
pub struct Validator {
    scratch: ScratchDir,
    languages: LanguageTable,
    runner: ProcessRunner,
    timeout: Duration,
}

impl Validator {
    pub fn new(
        scratch: ScratchDir,
        languages: LanguageTable,
        runner: ProcessRunner,
        timeout: Duration,
    ) -> Self {
        Self {
            scratch,
            languages,
            runner,
            timeout,
        }
    }

    /// Unknown languages are reported as a finding, not a hard failure.
    pub async fn validate(&self, code: &str, language: &str) -> ValidationResult {
        let spec = match self.languages.resolve(language) {
            Some((_, spec)) => spec,
            None => {
                return ValidationResult::from_errors(vec![format!(
                    "Validation not implemented for language: {}",
                    language
                )])
            }
        };

        let mut errors = Vec::new();
        match self.check(spec, code).await {
            Ok(stderr) if !stderr.is_empty() => errors.push(stderr),
            Ok(_) => {}
            Err(e) => errors.push(e.to_string()),
        }

        if !errors.is_empty() {
            log::debug!("Validation of {} code found {} error(s)", language, errors.len());
        }
        ValidationResult::from_errors(errors)
    }

    async fn check(&self, spec: &LanguageSpec, code: &str) -> Result<String, ExecutionError> {
        let scratch = self.scratch.acquire(&spec.extension, code).await?;
        let args = spec.check_args_for(scratch.path());
        let outcome = self.runner.run(&spec.program, &args, self.timeout).await;
        scratch.release().await;
        Ok(outcome?.stderr)
    }
}
