//! Retrieval: similarity scoring, vector index backends, and search policy

pub mod index;
pub mod search;
pub mod similarity;

pub use index::{ChunkStore, HnswIndex, IndexedRecord, LinearScanIndex, VectorIndexBackend};
pub use search::{Retriever, SearchOutcome, ServedBy};
pub use similarity::cosine_similarity;
