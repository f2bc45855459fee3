//! Question answering over an ingested document
//!
//! Ties retrieval and generation together: embed the question, search the
//! owning document's chunks, build a grounded prompt, and make a single
//! generation call. A document with nothing indexed gets a fixed answer and
//! no model call at all.

use std::sync::Arc;

use crate::config::{LlmConfig, RetrievalConfig};
use crate::embeddings::EmbeddingGateway;
use crate::error::{Error, Result};
use crate::generation::{truncate_chars, PromptBuilder};
use crate::providers::{GenerateOptions, GenerationProvider};
use crate::retrieval::Retriever;
use crate::storage::DocumentDb;
use crate::types::{Citation, ScoredChunk};

/// Answer returned when a document has no indexed chunks
pub const NO_CONTENT_ANSWER: &str =
    "This document has no indexed content, so the question cannot be answered from it. \
     The PDF may be image-based or contain no extractable text.";

/// Result of answering a question
#[derive(Debug)]
pub struct AnswerOutcome {
    /// Generated answer, or the fixed no-content message
    pub answer: String,
    /// Citations for the chunks behind the answer
    pub sources: Vec<Citation>,
    /// Name of the index backend that served the search
    pub backend: String,
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
}

/// Retrieval-augmented question answering engine
pub struct QueryEngine {
    db: Arc<DocumentDb>,
    gateway: EmbeddingGateway,
    retriever: Arc<Retriever>,
    generator: Arc<dyn GenerationProvider>,
    prompts: PromptBuilder,
    options: GenerateOptions,
    top_k: usize,
    source_preview_chars: usize,
}

impl QueryEngine {
    /// Create an engine from its collaborators and configuration
    pub fn new(
        db: Arc<DocumentDb>,
        gateway: EmbeddingGateway,
        retriever: Arc<Retriever>,
        generator: Arc<dyn GenerationProvider>,
        retrieval: &RetrievalConfig,
        llm: &LlmConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            retriever,
            generator,
            prompts: PromptBuilder::new(retrieval.context_preview_chars),
            options: GenerateOptions {
                temperature: llm.temperature,
                top_p: llm.top_p,
                max_output_tokens: llm.max_output_tokens,
            },
            top_k: retrieval.top_k,
            source_preview_chars: retrieval.source_preview_chars,
        }
    }

    /// Answer a question against one document
    pub async fn answer_question(&self, doc_id: &str, question: &str) -> Result<AnswerOutcome> {
        let doc_id = doc_id.trim();
        let question = question.trim();
        if doc_id.is_empty() {
            return Err(Error::invalid_input("document_id must not be empty"));
        }
        if question.is_empty() {
            return Err(Error::invalid_input("question must not be empty"));
        }

        if self.db.get_document(doc_id)?.is_none() {
            return Err(Error::DocumentNotFound(doc_id.to_string()));
        }

        let query_vector = self.gateway.embed_one(question).await?;
        let outcome = self
            .retriever
            .search(doc_id, &query_vector, self.top_k)
            .await?;

        if outcome.chunks.is_empty() {
            tracing::info!("{}: no chunks retrieved, skipping generation", doc_id);
            return Ok(AnswerOutcome {
                answer: NO_CONTENT_ANSWER.to_string(),
                sources: Vec::new(),
                backend: outcome.backend_name,
                chunks_retrieved: 0,
            });
        }

        tracing::debug!(
            "{}: retrieved {} chunks via {}",
            doc_id,
            outcome.chunks.len(),
            outcome.backend_name
        );

        let prompt = self.prompts.build_answer_prompt(question, &outcome.chunks);
        let answer = self.generator.generate(&prompt, &self.options).await?;

        let sources = self.citations(&outcome.chunks);
        Ok(AnswerOutcome {
            answer,
            sources,
            backend: outcome.backend_name,
            chunks_retrieved: outcome.chunks.len(),
        })
    }

    fn citations(&self, chunks: &[ScoredChunk]) -> Vec<Citation> {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| Citation {
                source_number: i + 1,
                page: chunk.metadata.page,
                paragraph_number: chunk.metadata.paragraph_number,
                paragraph_range: chunk.metadata.paragraph_range,
                chunk_index: chunk.chunk_index,
                preview: truncate_chars(&chunk.text, self.source_preview_chars),
                score: chunk.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::providers::EmbeddingProvider;
    use crate::retrieval::index::tests::make_chunk;
    use crate::retrieval::{ChunkStore, LinearScanIndex, VectorIndexBackend};
    use crate::types::{DocumentRecord, DocumentStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationProvider for CountingGenerator {
        async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Generated answer. [Source 1 - Page 1, Para 1]".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Fixture {
        engine: QueryEngine,
        generator: Arc<CountingGenerator>,
        backend: Arc<LinearScanIndex>,
        db: Arc<DocumentDb>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(ChunkStore::new());
        let backend = Arc::new(LinearScanIndex::new(store, 50));
        let retriever = Arc::new(Retriever::new(backend.clone(), backend.clone()));
        let db = Arc::new(DocumentDb::in_memory().unwrap());
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let gateway = EmbeddingGateway::new(
            Arc::new(FixedEmbedder),
            &EmbeddingConfig {
                dimensions: 2,
                batch_size: 100,
                batch_delay_ms: 0,
            },
        );
        let engine = QueryEngine::new(
            db.clone(),
            gateway,
            retriever,
            generator.clone(),
            &RetrievalConfig::default(),
            &LlmConfig::default(),
        );
        Fixture {
            engine,
            generator,
            backend,
            db,
        }
    }

    fn register(db: &DocumentDb, doc_id: &str, chunk_count: u32) {
        db.upsert_document(&DocumentRecord {
            doc_id: doc_id.to_string(),
            filename: "test.pdf".to_string(),
            text_length: 100,
            chunk_count,
            total_pages: 1,
            uploaded_at: Utc::now(),
            status: DocumentStatus::Processed,
        })
        .unwrap();
    }

    #[tokio::test]
    async fn answers_with_sources_for_an_indexed_document() {
        let fx = fixture();
        register(&fx.db, "doc-1", 2);
        fx.backend
            .upsert_document(
                "doc-1",
                &[make_chunk(0, "The grant totals 50,000."), make_chunk(1, "Other text.")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();

        let outcome = fx
            .engine
            .answer_question("doc-1", "How much is the grant?")
            .await
            .unwrap();

        assert_eq!(fx.generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.chunks_retrieved, 2);
        assert_eq!(outcome.backend, "linear-scan");
        assert_eq!(outcome.sources.len(), 2);
        assert_eq!(outcome.sources[0].source_number, 1);
        assert_eq!(outcome.sources[0].preview, "The grant totals 50,000.");
        assert!(outcome.answer.contains("Generated answer"));
    }

    #[tokio::test]
    async fn empty_document_short_circuits_without_generation() {
        let fx = fixture();
        register(&fx.db, "doc-empty", 0);

        let outcome = fx
            .engine
            .answer_question("doc-empty", "Anything in here?")
            .await
            .unwrap();

        assert_eq!(fx.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.answer, NO_CONTENT_ANSWER);
        assert!(outcome.sources.is_empty());
        assert_eq!(outcome.chunks_retrieved, 0);
    }

    #[tokio::test]
    async fn unknown_document_is_rejected_before_any_work() {
        let fx = fixture();
        let err = fx
            .engine
            .answer_question("doc-missing", "Hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
        assert_eq!(fx.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_inputs_are_invalid() {
        let fx = fixture();
        let err = fx.engine.answer_question("  ", "question").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = fx.engine.answer_question("doc-1", "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn long_source_text_is_previewed() {
        let fx = fixture();
        register(&fx.db, "doc-long", 1);
        let long_text = "x".repeat(500);
        fx.backend
            .upsert_document("doc-long", &[make_chunk(0, &long_text)], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let outcome = fx
            .engine
            .answer_question("doc-long", "What does it say?")
            .await
            .unwrap();

        let preview = &outcome.sources[0].preview;
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 303);
    }
}
