//! PDF question answering with page and paragraph citations
//!
//! Upload a PDF, ask questions about it, and get answers grounded in the
//! document's own text, each backed by `[Source N - Page P, Para Q]`
//! citations. Retrieval runs over an in-memory HNSW index with a
//! brute-force fallback; embeddings and generation come from a local
//! Ollama server.
//!
//! # Architecture
//!
//! - [`ingestion`]: PDF extraction and paragraph-aware chunking
//! - [`embeddings`]: batched gateway to the embedding provider
//! - [`retrieval`]: cosine similarity, vector index backends, fallback policy
//! - [`generation`]: grounded prompt assembly
//! - [`query`]: the question answering engine
//! - [`storage`]: SQLite document registry
//! - [`server`]: axum HTTP API

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod query;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use query::{AnswerOutcome, QueryEngine};
