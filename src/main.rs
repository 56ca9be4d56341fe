use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use rmcp::{ServiceExt, transport::stdio};
use clap::Parser;
use estandares_mcp::gemini::{DEFAULT_GEMINI_MODEL, GeminiClient};
use estandares_mcp::relevance::RelevancePipeline;
use estandares_mcp::server::Standards;
use estandares_mcp::storage::StandardsStore;

#[cfg(feature = "trace")]
use tracing_subscriber::{EnvFilter};

#[derive(Parser)]
struct Cli {
    /// Folder holding the standard documents (.md)
    #[clap(long, default_value = "estandares")]
    docs_dir: String,
    /// Gemini model used to rank document relevance
    #[clap(long, default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,
    /// Gemini API key (optional; relevance search reports the oracle as
    /// unavailable without one)
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
    /// Timeout in seconds for each Gemini request
    #[clap(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    oracle_timeout_secs: u64,
}

/// You can inspect the server using the Model Context Protocol Inspector.
/// npx @modelcontextprotocol/inspector cargo run -p estandares-mcp

#[tokio::main]
async fn main() -> Result<()> {
    // Get command line arguments
    let args = Cli::parse();

    // Initialize the tracing subscriber with file logging; stdout belongs to
    // the stdio transport.
    #[cfg(feature = "trace")]
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_writer(std::fs::File::create("server.log")?)
        .with_ansi(false)
        .init();

    tracing::info!("Starting MCP server");

    let store = Arc::new(StandardsStore::new(&args.docs_dir));
    tracing::info!("Serving standard documents from {:?}", store.docs_dir());

    if args.gemini_api_key.is_none() {
        tracing::warn!("No Gemini API key configured; relevance search will report the oracle as unavailable");
    }

    let oracle = GeminiClient::new(
        args.gemini_model,
        args.gemini_api_key,
        Duration::from_secs(args.oracle_timeout_secs),
    )?;
    let pipeline = RelevancePipeline::new(store.clone(), oracle);

    let service = Standards::new(store, pipeline)
        .serve(stdio()).await.inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}
