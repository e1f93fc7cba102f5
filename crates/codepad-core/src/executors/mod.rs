//! Code execution for untrusted, user-submitted source text.
//!
//! A request's code is written to a scratch file and run by the host's own
//! interpreter in a child process with a wall-clock deadline. The interpreter
//! inherits the host environment, so this is a trusted-host runner rather
//! than an isolation boundary. Syntax checks reuse the same path through each
//! interpreter's compile-only mode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorKind;

pub mod language;
pub mod process;
pub mod scratch;
pub mod service;
pub mod validator;

pub use language::{Language, LanguageSpec, LanguageTable};
pub use process::{ProcessOutput, ProcessRunner};
pub use scratch::{ScratchDir, ScratchFile};
pub use service::CodeExecutionService;
pub use validator::Validator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub project_id: Option<i64>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            project_id: None,
        }
    }

    pub fn with_project_id(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// Uniform outcome of one execution. Failures are reported through `error`
/// and `error_kind` rather than as an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Wall-clock milliseconds from call start to resolution.
    pub execution_time: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none()
    }

    pub fn timed_out(&self) -> bool {
        self.error_kind == Some(ErrorKind::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Runs the request's code. Never fails; see `ExecutionResult`.
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult;

    /// Syntax-only check of `code`.
    async fn validate(&self, code: &str, language: &str) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_accepts_camel_case_project_id() {
        let request: ExecutionRequest = serde_json::from_value(json!({
            "code": "print(1)",
            "language": "python",
            "projectId": 7
        }))
        .unwrap();
        assert_eq!(request.project_id, Some(7));

        let without: ExecutionRequest =
            serde_json::from_value(json!({"code": "1", "language": "js"})).unwrap();
        assert_eq!(without.project_id, None);
    }

    #[test]
    fn test_result_shape_omits_absent_fields() {
        let ok = ExecutionResult {
            output: Some("hi\n".to_string()),
            error: None,
            error_kind: None,
            execution_time: 12,
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"output": "hi\n", "executionTime": 12})
        );

        let failed = ExecutionResult {
            output: None,
            error: Some("Code execution timed out after 30000 ms".to_string()),
            error_kind: Some(ErrorKind::Timeout),
            execution_time: 30_001,
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["errorKind"], "timeout");
        assert!(value.get("output").is_none());
        assert!(failed.timed_out());
    }

    #[test]
    fn test_validation_result_validity_follows_errors() {
        assert!(ValidationResult::from_errors(vec![]).is_valid);
        let invalid = ValidationResult::from_errors(vec!["bad".to_string()]);
        assert_eq!(
            serde_json::to_value(&invalid).unwrap(),
            json!({"isValid": false, "errors": ["bad"]})
        );
    }
}
