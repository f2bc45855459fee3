//! Document Q&A server binary
//!
//! Run with: cargo run --bin docrag-server

use docrag::{config::RagConfig, server::RagServer};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docrag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration: DOCRAG_CONFIG, then ./config.toml, then defaults
    let config = match std::env::var("DOCRAG_CONFIG") {
        Ok(path) => RagConfig::from_file(&path)?,
        Err(_) if Path::new("config.toml").exists() => RagConfig::from_file("config.toml")?,
        Err(_) => RagConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Generation model: {}", config.llm.generate_model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.llm.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
            tracing::warn!("Start it with: ollama serve");
            tracing::warn!(
                "Then pull models: ollama pull {} && ollama pull {}",
                config.llm.embed_model,
                config.llm.generate_model
            );
        }
    }

    let server = RagServer::new(config)?;

    tracing::info!("API: http://{}", server.address());
    tracing::info!("Health: http://{}/health", server.address());
    tracing::info!("API info: http://{}/api/info", server.address());

    server.start().await?;

    Ok(())
}
