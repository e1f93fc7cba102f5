//! Error types for the Codepad server.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the Codepad server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Submitted code did not pass the syntax check
    #[error("Code validation failed")]
    ValidationFailed(Vec<String>),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a new invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert ServerError to HTTP status code
impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::ValidationFailed(_) => 400,
            ServerError::Config(_) | ServerError::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::ValidationFailed(_) => "validation_failed",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }

    /// Client-facing message. Invalid requests carry their text as is.
    pub fn message(&self) -> String {
        match self {
            ServerError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Malformed or mistyped request bodies are reported as invalid requests.
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = json!({
            "message": self.message(),
            "error_type": self.error_type(),
            "timestamp": chrono::Utc::now(),
        });
        if let ServerError::ValidationFailed(errors) = &self {
            body["errors"] = json!(errors);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::invalid_request("x").status_code(), 400);
        assert_eq!(ServerError::ValidationFailed(vec![]).status_code(), 400);
        assert_eq!(ServerError::internal("boom").status_code(), 500);
        assert_eq!(ServerError::config_error("bad").error_type(), "config_error");
    }

    #[test]
    fn test_invalid_request_message_is_verbatim() {
        let err = ServerError::invalid_request("Code and language are required");
        assert_eq!(err.message(), "Code and language are required");
        assert_eq!(err.to_string(), "Invalid request: Code and language are required");
    }
}
