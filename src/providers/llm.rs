//! Generation provider trait for answer synthesis

use async_trait::async_trait;
use crate::error::Result;

/// Sampling options for a single generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling parameter
    pub top_p: f32,
    /// Maximum tokens in the generated output
    pub max_output_tokens: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            max_output_tokens: 1024,
        }
    }
}

/// Trait for single-shot text generation
///
/// Implementations:
/// - `OllamaGenerator`: local Ollama server
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text from a prompt, single-shot, no streaming
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
