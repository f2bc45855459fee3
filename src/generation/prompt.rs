//! Prompt assembly for grounded question answering

use crate::types::ScoredChunk;

/// Builds the context block and answer prompt from retrieved chunks
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// Per-excerpt cap on context characters
    context_chars: usize,
}

impl PromptBuilder {
    /// Create a builder with the given per-excerpt context cap
    pub fn new(context_chars: usize) -> Self {
        Self { context_chars }
    }

    /// Render retrieved chunks as numbered, labelled excerpts
    ///
    /// Each excerpt is headed `[Source N - Page P, Para Q]` so the model can
    /// cite it back. Excerpt text is capped at the configured length.
    pub fn build_context(&self, chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                format!(
                    "[Source {} - Page {}, Para {}]\n{}",
                    i + 1,
                    chunk.metadata.page,
                    chunk.metadata.paragraph_range,
                    truncate_chars(&chunk.text, self.context_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Full prompt instructing the model to answer only from the excerpts
    pub fn build_answer_prompt(&self, question: &str, chunks: &[ScoredChunk]) -> String {
        let context = self.build_context(chunks);
        format!(
            "You are a helpful assistant answering questions about a document.\n\
             Use ONLY the excerpts below to answer. If the excerpts do not contain\n\
             the answer, say so plainly instead of guessing.\n\
             When you use an excerpt, cite it as [Source N - Page P, Para Q],\n\
             matching the labels below.\n\n\
             Excerpts:\n{}\n\n\
             Question: {}\n\n\
             Answer:",
            context, question
        )
    }
}

/// Truncate to at most `max_chars` characters, appending an ellipsis
///
/// Operates on character counts, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
