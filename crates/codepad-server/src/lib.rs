//! HTTP surface for the Codepad code execution service
//!
//! Exposes execution, syntax validation and execution history as JSON
//! endpoints. Every execute request is syntax-checked first, and programs
//! that fail the check are rejected before an interpreter runs them.

pub mod error;

pub use error::{Result, ServerError};

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Json as AxumJson, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, options, post};
use axum::{middleware, Router};
use codepad_core::executors::language::{InterpreterStatus, LanguageTable};
use codepad_core::{
    CodeExecutor, ExecutionHistory, ExecutionRecord, ExecutionRequest, ExecutionResult,
    ServerSettings, ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub interpreters: Vec<InterpreterStatus>,
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
    /// Records returned by the history endpoint when no limit is given
    pub default_history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            enable_cors: true,
            cors_origins: None, // Allow any origin
            max_body_size: 1024 * 1024, // 1MB
            enable_logging: true,
            default_history_limit: 50,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `server` section of the YAML configuration.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        let config = Self::default()
            .with_bind_addr_str(&settings.bind_addr)?
            .with_cors(settings.enable_cors)
            .with_max_body_size(settings.max_body_size)
            .with_logging(settings.enable_logging);
        Ok(match &settings.cors_origins {
            Some(origins) => config.with_cors_origins(origins.clone()),
            None => config,
        })
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Set the default page size of the history endpoint.
    pub fn with_default_history_limit(mut self, limit: usize) -> Self {
        self.default_history_limit = limit;
        self
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn CodeExecutor>,
    pub history: Arc<dyn ExecutionHistory>,
    pub languages: Option<LanguageTable>,
    pub config: ServerConfig,
}

/// Body of the execute and validate endpoints. Fields default to empty so a
/// missing field gets the same 400 as an empty one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub project_id: Option<i64>,
}

impl CodeSubmission {
    fn require_fields(&self) -> Result<()> {
        if self.code.is_empty() || self.language.trim().is_empty() {
            return Err(ServerError::invalid_request("Code and language are required"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

/// Handler for the /api/execute POST endpoint.
async fn execute_handler(
    State(app_state): State<AppState>,
    payload: std::result::Result<AxumJson<CodeSubmission>, JsonRejection>,
) -> Result<Json<ExecutionResult>> {
    let AxumJson(submission) = payload?;
    submission.require_fields()?;
    log::info!(
        "Received execute request for {} code ({} bytes)",
        submission.language,
        submission.code.len()
    );

    let validation = app_state
        .executor
        .validate(&submission.code, &submission.language)
        .await;
    if !validation.is_valid {
        log::info!("Rejecting execution: {} validation error(s)", validation.errors.len());
        return Err(ServerError::ValidationFailed(validation.errors));
    }

    let request = ExecutionRequest {
        code: submission.code,
        language: submission.language,
        project_id: submission.project_id,
    };
    let result = app_state.executor.execute(request.clone()).await;
    app_state.history.record(&request, &result).await;

    log::info!(
        "Execution finished in {} ms (success: {})",
        result.execution_time,
        result.is_success()
    );
    Ok(Json(result))
}

/// Handler for the /api/validate POST endpoint.
async fn validate_handler(
    State(app_state): State<AppState>,
    payload: std::result::Result<AxumJson<CodeSubmission>, JsonRejection>,
) -> Result<Json<ValidationResult>> {
    let AxumJson(submission) = payload?;
    submission.require_fields()?;
    log::debug!("Received validate request for {} code", submission.language);

    let validation = app_state
        .executor
        .validate(&submission.code, &submission.language)
        .await;
    Ok(Json(validation))
}

/// Handler for the /api/execution-history GET endpoint.
async fn history_handler(
    State(app_state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<ExecutionRecord>> {
    let limit = query
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(app_state.config.default_history_limit);
    log::debug!("Received execution history request (limit {})", limit);

    Json(app_state.history.recent(limit).await)
}

async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let interpreters = app_state
        .languages
        .as_ref()
        .map(|table| table.available())
        .unwrap_or_default();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        interpreters,
    })
}

/// The Codepad HTTP server.
pub struct CodepadServer {
    executor: Arc<dyn CodeExecutor>,
    history: Arc<dyn ExecutionHistory>,
    languages: Option<LanguageTable>,
    config: ServerConfig,
}

impl CodepadServer {
    /// Create a new server with default configuration.
    pub fn new(executor: Arc<dyn CodeExecutor>, history: Arc<dyn ExecutionHistory>) -> Self {
        Self::with_config(executor, history, ServerConfig::default())
    }

    /// Create a new server with custom configuration.
    pub fn with_config(
        executor: Arc<dyn CodeExecutor>,
        history: Arc<dyn ExecutionHistory>,
        config: ServerConfig,
    ) -> Self {
        Self {
            executor,
            history,
            languages: None,
            config,
        }
    }

    /// Report interpreter availability for this table on /health.
    pub fn with_languages(mut self, languages: LanguageTable) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            executor: self.executor.clone(),
            history: self.history.clone(),
            languages: self.languages.clone(),
            config: self.config.clone(),
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/api/execute", post(execute_handler))
            .route("/api/validate", post(validate_handler))
            .route("/api/execution-history", get(history_handler))
            // CORS preflight
            .route("/api/execute", options(|| async { StatusCode::OK }))
            .route("/api/validate", options(|| async { StatusCode::OK }))
            .route("/api/execution-history", options(|| async { StatusCode::OK }))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    // health probes are frequent; keep them out of info logs
                    if uri.path() == "/health" {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    let duration = start.elapsed();

                    if uri.path() == "/health" {
                        log::debug!("Response {} completed in {:?}", request_id, duration);
                    } else {
                        log::info!(
                            "Response {} {} completed in {:?}",
                            request_id,
                            response.status(),
                            duration
                        );
                    }

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = if let Some(ref origins) = self.config.cors_origins {
                let origins: std::result::Result<Vec<_>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => CorsLayer::permissive(),
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| {
                ServerError::config_error(format!(
                    "Failed to bind to {}: {}",
                    self.config.bind_addr, e
                ))
            })?;

        log::info!("Codepad server starting on {}", self.config.bind_addr);
        log::info!("Health check: http://{}/health", self.config.bind_addr);
        log::info!("Execute endpoint: http://{}/api/execute", self.config.bind_addr);
        log::info!("Validate endpoint: http://{}/api/validate", self.config.bind_addr);
        log::info!(
            "Execution history: http://{}/api/execution-history",
            self.config.bind_addr
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("Codepad server shut down gracefully");
        Ok(())
    }

    /// Start the server and run until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
