//! recipe-ingest - Recipe import webhook service
//!
//! Receives database automation webhooks carrying a recipe URL, extracts the
//! recipe through the strategy cascade, and writes it back to the originating
//! Notion page.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_common::config::{self, ServiceConfig};
use recipe_ingest::extractors::{OpenAiChatClient, TextModel};
use recipe_ingest::services::{HttpFetcher, NotionClient};
use recipe_ingest::workflow::{ExtractionOrchestrator, RecipeImporter};
use recipe_ingest::{build_router, AppState};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for recipe-ingest
#[derive(Parser, Debug)]
#[command(name = "recipe-ingest")]
#[command(about = "Recipe import webhook service")]
#[command(version)]
struct Args {
    /// Configuration file (overrides RECIPE_INGEST_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook HTTP service
    Serve,
    /// Extract one URL and print the result as JSON
    Extract {
        url: String,
    },
    /// Write a default configuration file
    InitConfig {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::InitConfig { path } = &args.command {
        config::write_config(&ServiceConfig::default(), path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging.level);

    info!(
        "Starting recipe-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    log_config_source(args.config.as_deref());

    match args.command {
        Command::Serve => serve(config).await,
        Command::Extract { url } => extract_once(config, &url).await,
        Command::InitConfig { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins; otherwise the configured level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn log_config_source(cli_arg: Option<&Path>) {
    match config::resolve_config_path(cli_arg) {
        Ok(Some(path)) => info!("Configuration: {}", path.display()),
        _ => info!("Configuration: compiled defaults"),
    }
}

fn build_orchestrator(config: &ServiceConfig, fetcher: Arc<HttpFetcher>) -> Result<ExtractionOrchestrator> {
    let model = OpenAiChatClient::from_config(&config.llm)
        .context("Failed to build model client")?
        .map(|client| {
            info!(model = %config.llm.model, "Model fallback enabled");
            Arc::new(client) as Arc<dyn TextModel>
        });

    Ok(ExtractionOrchestrator::with_fetcher(
        fetcher,
        model,
        config.llm.max_html_chars,
    ))
}

async fn serve(config: ServiceConfig) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(&config.http).context("Failed to build HTTP client")?);
    let orchestrator = Arc::new(build_orchestrator(&config, Arc::clone(&fetcher))?);

    let store = NotionClient::new(fetcher.client().clone(), &config.notion)
        .context("NOTION_API_KEY is required to serve webhooks")?;
    if config.notion.database_id.is_none() {
        info!("No Notion database id configured, Unique ID lookup disabled");
    }

    let importer = RecipeImporter::new(orchestrator, Arc::new(store), config.notion.database_id.clone());
    let app = build_router(AppState::new(Arc::new(importer)));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!("Listening on http://{}", config.server.bind_address);
    info!("Health check: http://{}/health", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

async fn extract_once(config: ServiceConfig, url: &str) -> Result<()> {
    let url = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    let fetcher = Arc::new(HttpFetcher::new(&config.http).context("Failed to build HTTP client")?);
    let orchestrator = build_orchestrator(&config, fetcher)?;

    let result = orchestrator.extract(&url).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
