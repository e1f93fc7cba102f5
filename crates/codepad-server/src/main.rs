//! Codepad server binary
//!
//! Hosts the code execution service over HTTP, and doubles as a command-line
//! runner so a single file can be executed or syntax-checked with the same
//! configuration the server would use.

use anyhow::Result;
use clap::{Parser, Subcommand};
use codepad_core::{
    config::ConfigLoader, CodeExecutionService, CodeExecutor, CodepadConfig, ExecutionRequest,
    InMemoryHistory, Language,
};
use codepad_server::{CodepadServer, ServerConfig};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "codepad.yaml";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Codepad Server - run user code in interpreter subprocesses")]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(long, short, default_value = DEFAULT_CONFIG, help = "Configuration source: file path or URL")]
    config: String,

    #[clap(long, help = "Override the configured bind address")]
    bind_addr: Option<String>,

    #[clap(long, short, help = "Log level (defaults to logging.level from the configuration)")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default command)
    Serve {
        #[clap(long)]
        bind_addr: Option<String>,
    },
    /// Execute a source file once and print the result as JSON
    Run {
        file: PathBuf,
        #[clap(long, short = 'L', help = "Language; inferred from the file extension if omitted")]
        language: Option<String>,
    },
    /// Syntax-check a source file and print the result as JSON
    Check {
        file: PathBuf,
        #[clap(long, short = 'L', help = "Language; inferred from the file extension if omitted")]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, source) = load_configuration(&cli.config).await?;

    // Initialize logger
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_level_filter = level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    match &source {
        Some(source) => log::info!("Configuration loaded from: {}", source),
        None => log::warn!(
            "No configuration found at '{}', using defaults and environment overrides",
            cli.config
        ),
    }

    match cli.command {
        Some(Commands::Serve { bind_addr }) => {
            run_server(config, bind_addr.or(cli.bind_addr)).await
        }
        Some(Commands::Run { file, language }) => run_file(&config, &file, language).await,
        Some(Commands::Check { file, language }) => check_file(&config, &file, language).await,
        None => run_server(config, cli.bind_addr).await,
    }
}

/// Loads from the given source. When the default file is absent, the
/// per-user config directory is tried before falling back to defaults.
async fn load_configuration(source: &str) -> Result<(CodepadConfig, Option<String>)> {
    if source.starts_with("http://") || source.starts_with("https://") || Path::new(source).exists() {
        let config = ConfigLoader::from_source(source).await?;
        return Ok((config, Some(source.to_string())));
    }

    if source != DEFAULT_CONFIG {
        anyhow::bail!("Configuration file '{}' does not exist", source);
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("codepad").join(DEFAULT_CONFIG)) {
        if user_config.exists() {
            let config = ConfigLoader::from_file(&user_config).await?;
            return Ok((config, Some(user_config.display().to_string())));
        }
    }

    Ok((ConfigLoader::from_env()?, None))
}

async fn run_server(config: CodepadConfig, bind_addr: Option<String>) -> Result<()> {
    let service = CodeExecutionService::new(&config.execution)?;
    for status in service.languages().available() {
        if status.available {
            log::info!("Interpreter for {}: {}", status.language, status.program);
        } else {
            log::warn!(
                "Interpreter for {} ('{}') not found on PATH; requests will fail to spawn",
                status.language,
                status.program
            );
        }
    }

    let mut server_config = ServerConfig::from_settings(&config.server)?
        .with_default_history_limit(config.history.default_limit);
    if let Some(addr) = bind_addr {
        server_config = server_config.with_bind_addr_str(&addr)?;
    }

    let languages = service.languages().clone();
    let history = Arc::new(InMemoryHistory::new(config.history.capacity));
    let server = CodepadServer::with_config(Arc::new(service), history, server_config)
        .with_languages(languages);

    if let Err(e) = server.serve().await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}

fn resolve_language(file: &Path, language: Option<String>) -> Result<String> {
    match language {
        Some(language) => Ok(language),
        None => Language::from_path(file)
            .map(|l| l.to_string())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Cannot infer language of '{}'; pass --language",
                    file.display()
                )
            }),
    }
}

async fn run_file(config: &CodepadConfig, file: &Path, language: Option<String>) -> Result<()> {
    let language = resolve_language(file, language)?;
    let code = tokio::fs::read_to_string(file).await?;
    let service = CodeExecutionService::new(&config.execution)?;

    let result = service.execute(ExecutionRequest::new(code, language)).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn check_file(config: &CodepadConfig, file: &Path, language: Option<String>) -> Result<()> {
    let language = resolve_language(file, language)?;
    let code = tokio::fs::read_to_string(file).await?;
    let service = CodeExecutionService::new(&config.execution)?;

    let result = service.validate(&code, &language).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_valid {
        std::process::exit(1);
    }
    Ok(())
}
