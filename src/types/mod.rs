//! Core data types shared across the RAG pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{
    Chunk, ChunkMetadata, DocumentRecord, DocumentStatus, Page, ParagraphRange,
};
pub use query::AskRequest;
pub use response::{Citation, DocumentListResponse, IngestResponse, QueryResponse, ScoredChunk};
