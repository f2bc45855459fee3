//! Retriever with one-shot fallback across the two index backends
//!
//! The primary backend is tried exactly once per search. On any error the
//! fallback is tried, also exactly once; its error, if any, is the one the
//! caller sees. Every successful outcome carries a tag naming the backend
//! that served it.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{Chunk, ScoredChunk};

use super::index::VectorIndexBackend;

/// Which backend produced a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedBy {
    /// The primary (approximate) index
    Primary,
    /// The brute-force fallback
    Fallback,
}

impl ServedBy {
    /// Stable string form for responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedBy::Primary => "primary",
            ServedBy::Fallback => "fallback",
        }
    }
}

/// A successful search with its serving backend
#[derive(Debug)]
pub struct SearchOutcome {
    /// Retrieved chunks, descending by score
    pub chunks: Vec<ScoredChunk>,
    /// Which backend answered
    pub served_by: ServedBy,
    /// Name of the backend that answered
    pub backend_name: String,
}

/// Search front-end over a primary and a fallback index backend
pub struct Retriever {
    primary: Arc<dyn VectorIndexBackend>,
    fallback: Arc<dyn VectorIndexBackend>,
}

impl Retriever {
    /// Create a retriever over the given backends
    pub fn new(primary: Arc<dyn VectorIndexBackend>, fallback: Arc<dyn VectorIndexBackend>) -> Self {
        Self { primary, fallback }
    }

    /// Index chunks and their embeddings through the primary backend
    pub async fn upsert_document(
        &self,
        doc_id: &str,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        self.primary.upsert_document(doc_id, chunks, vectors).await
    }

    /// Search the primary backend, falling back on failure
    ///
    /// No retries on either side: one attempt against the primary, at most
    /// one against the fallback.
    pub async fn search(&self, doc_id: &str, query: &[f32], top_k: usize) -> Result<SearchOutcome> {
        match self.primary.search(doc_id, query, top_k).await {
            Ok(chunks) => Ok(SearchOutcome {
                chunks,
                served_by: ServedBy::Primary,
                backend_name: self.primary.name().to_string(),
            }),
            Err(err) => {
                tracing::warn!(
                    "Primary index '{}' failed ({}), falling back to '{}'",
                    self.primary.name(),
                    err,
                    self.fallback.name()
                );
                let chunks = self.fallback.search(doc_id, query, top_k).await?;
                Ok(SearchOutcome {
                    chunks,
                    served_by: ServedBy::Fallback,
                    backend_name: self.fallback.name().to_string(),
                })
            }
        }
    }

    /// Remove a document from both backends; idempotent
    pub async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.primary.delete_document(doc_id).await?;
        self.fallback.delete_document(doc_id).await
    }
}
