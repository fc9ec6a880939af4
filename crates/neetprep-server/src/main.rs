//! NeetPrep — NEET exam prep server with a streaming AI tutor.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use neetprep_chat::LLMConfig;
use neetprep_core::AppConfig;
use neetprep_ingest::Ingester;
use neetprep_server::{build_router, AppState};
use neetprep_store::SupabaseClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "ingest" | "--ingest" => {
                let dir = args.get(2).map(PathBuf::from);
                return ingest(dir).await;
            }
            "--help" | "-h" | "help" => {
                println!("NeetPrep — NEET exam prep server");
                println!();
                println!("Usage: neetprep [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  ingest [content-dir]     Chunk, embed and store study material");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'neetprep help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    serve().await
}

async fn serve() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let llm_config = LLMConfig::load(&config.llm_config_file);
    let port = config.port;

    let state = Arc::new(AppState::new(config, llm_config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("NeetPrep server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn ingest(dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let service_key = config
        .supabase_service_role_key
        .clone()
        .context("SUPABASE_SERVICE_ROLE_KEY is required for ingest")?;
    let llm_config = LLMConfig::load(&config.llm_config_file);
    let provider = llm_config.embeddings_provider()?;

    let http = reqwest::Client::new();
    let store = SupabaseClient::new(http.clone(), &config.supabase_url, &service_key);
    let dir = dir.unwrap_or_else(|| config.content_dir.clone());

    info!("Ingesting content from {}", dir.display());
    let report = Ingester::new(&store, &http, &provider, &provider.model)
        .ingest_dir(&dir)
        .await?;
    println!(
        "Done. {} documents, {} chunks.",
        report.documents, report.chunks
    );
    Ok(())
}
