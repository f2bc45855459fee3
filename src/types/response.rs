//! Response types for RAG queries and ingestion

use serde::{Deserialize, Serialize};

use super::document::{ChunkMetadata, DocumentRecord, ParagraphRange};

/// A chunk returned by a vector search, scored by similarity
///
/// Transient: produced per search, never persisted. Scores from the
/// approximate index and the brute-force fallback are both
/// higher-is-better but not guaranteed numerically identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Chunk text
    pub text: String,
    /// Positional metadata for citation rendering
    pub metadata: ChunkMetadata,
    /// Similarity score, higher is better
    pub score: f32,
}

/// Source citation returned with an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position in the context given to the model
    pub source_number: usize,
    /// Page number (1-indexed)
    pub page: u32,
    /// First contributing paragraph
    pub paragraph_number: u32,
    /// Contributing paragraph range
    pub paragraph_range: ParagraphRange,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Truncated preview of the source text
    pub preview: String,
    /// Similarity score of the underlying chunk
    pub score: f32,
}

/// Response from POST /api/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer (or the fixed no-context message)
    pub answer: String,
    /// Source citations backing the answer
    pub sources: Vec<Citation>,
    /// Which index backend served the search ("hnsw" or "linear-scan")
    pub backend: String,
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Response from POST /api/documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Whether ingestion succeeded
    pub success: bool,
    /// The created document record
    pub document: DocumentRecord,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Response for GET /api/documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// Documents, newest first
    pub documents: Vec<DocumentRecord>,
    /// Total count
    pub total_count: usize,
}
