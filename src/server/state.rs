//! Application state for the document Q&A server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::embeddings::EmbeddingGateway;
use crate::error::Result;
use crate::ingestion::{Chunker, IngestPipeline};
use crate::providers::{OllamaClient, OllamaEmbedder, OllamaGenerator};
use crate::query::QueryEngine;
use crate::retrieval::{ChunkStore, HnswIndex, LinearScanIndex, Retriever};
use crate::storage::DocumentDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Document registry
    db: Arc<DocumentDb>,
    /// Ingestion pipeline
    pipeline: IngestPipeline,
    /// Question answering engine
    engine: QueryEngine,
    /// Ollama client, for health reporting
    ollama: Arc<OllamaClient>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: RagConfig) -> Result<Self> {
        let db = Arc::new(DocumentDb::new(&config.database.path)?);
        tracing::info!(
            "Document registry opened at {}",
            config.database.path.display()
        );

        let ollama = Arc::new(OllamaClient::new(&config.llm)?);
        tracing::info!(
            "Ollama client initialized (embed: {}, generate: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        let embedder = Arc::new(OllamaEmbedder::new(
            Arc::clone(&ollama),
            config.embeddings.dimensions,
        ));
        let gateway = EmbeddingGateway::new(embedder, &config.embeddings);

        let store = Arc::new(ChunkStore::new());
        let primary = Arc::new(HnswIndex::new(
            Arc::clone(&store),
            config.embeddings.dimensions,
            config.retrieval.hnsw_m,
            config.retrieval.hnsw_ef_construction,
            config.retrieval.hnsw_ef_search,
            config.retrieval.hnsw_max_elements,
            config.retrieval.candidate_multiplier,
        ));
        let fallback = Arc::new(LinearScanIndex::new(
            Arc::clone(&store),
            config.retrieval.scan_limit,
        ));
        let retriever = Arc::new(Retriever::new(primary, fallback));
        tracing::info!("Vector index initialized (hnsw primary, linear-scan fallback)");

        let generator = Arc::new(OllamaGenerator::new(Arc::clone(&ollama)));

        let pipeline = IngestPipeline::new(
            Chunker::from_config(&config.chunking),
            gateway.clone(),
            Arc::clone(&retriever),
            Arc::clone(&db),
        );
        let engine = QueryEngine::new(
            Arc::clone(&db),
            gateway,
            retriever,
            generator,
            &config.retrieval,
            &config.llm,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                pipeline,
                engine,
                ollama,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the document registry
    pub fn db(&self) -> &Arc<DocumentDb> {
        &self.inner.db
    }

    /// Get the ingestion pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Get the question answering engine
    pub fn engine(&self) -> &QueryEngine {
        &self.inner.engine
    }

    /// Get the Ollama client
    pub fn ollama(&self) -> &Arc<OllamaClient> {
        &self.inner.ollama
    }
}
