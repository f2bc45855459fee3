//! Provider traits and implementations for the external model services

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerateOptions, GenerationProvider};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};
