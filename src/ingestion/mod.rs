//! Ingestion: PDF extraction, chunking, and the indexing pipeline

pub mod chunker;
pub mod extractor;

pub use chunker::Chunker;
pub use extractor::{ExtractedDocument, PdfExtractor};

use std::sync::Arc;

use crate::embeddings::EmbeddingGateway;
use crate::error::{Error, Result};
use crate::retrieval::Retriever;
use crate::storage::DocumentDb;
use crate::types::{DocumentRecord, Page};

/// End-to-end ingestion: extract, chunk, embed, index, register
///
/// Stages run in order and nothing is persisted until all of them succeed,
/// so a failed upload leaves no partial document behind.
pub struct IngestPipeline {
    chunker: Chunker,
    gateway: EmbeddingGateway,
    retriever: Arc<Retriever>,
    db: Arc<DocumentDb>,
}

impl IngestPipeline {
    /// Create a pipeline over the given stages
    pub fn new(
        chunker: Chunker,
        gateway: EmbeddingGateway,
        retriever: Arc<Retriever>,
        db: Arc<DocumentDb>,
    ) -> Self {
        Self {
            chunker,
            gateway,
            retriever,
            db,
        }
    }

    /// Ingest a PDF upload
    pub async fn ingest_pdf(&self, filename: &str, data: &[u8]) -> Result<DocumentRecord> {
        if data.is_empty() {
            return Err(Error::invalid_input("Uploaded file is empty"));
        }

        let extracted = PdfExtractor::extract(filename, data)?;
        self.ingest_pages(filename, &extracted.pages, extracted.total_pages)
            .await
    }

    /// Ingest pre-extracted pages
    ///
    /// A document whose pages hold no chunkable text is still registered;
    /// questions against it get the standard no-content answer.
    pub async fn ingest_pages(
        &self,
        filename: &str,
        pages: &[Page],
        total_pages: u32,
    ) -> Result<DocumentRecord> {
        let chunks = self.chunker.chunk(pages);
        let text_length: usize = pages.iter().map(|p| p.text.len()).sum();

        let record = DocumentRecord::new(
            filename.to_string(),
            text_length,
            chunks.len() as u32,
            total_pages,
        );

        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = self.gateway.embed_many(&texts).await?;
            self.retriever
                .upsert_document(&record.doc_id, &chunks, &vectors)
                .await?;
        }

        if let Err(err) = self.db.upsert_document(&record) {
            // Roll back the index so a failed registration leaves nothing behind
            let _ = self.retriever.delete_document(&record.doc_id).await;
            return Err(err);
        }

        tracing::info!(
            "Ingested {} as {} ({} chunks over {} pages)",
            filename,
            record.doc_id,
            record.chunk_count,
            record.total_pages
        );
        Ok(record)
    }

    /// Delete a document from the registry and both index backends
    pub async fn delete_document(&self, doc_id: &str) -> Result<()> {
        if !self.db.delete_document(doc_id)? {
            return Err(Error::DocumentNotFound(doc_id.to_string()));
        }
        self.retriever.delete_document(doc_id).await?;
        tracing::info!("Deleted document {}", doc_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkingConfig, EmbeddingConfig};
    use crate::providers::EmbeddingProvider;
    use crate::retrieval::{ChunkStore, LinearScanIndex};
    use async_trait::async_trait;

    struct HashEmbedder;

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "hash"
        }
    }

    fn pipeline() -> (IngestPipeline, Arc<Retriever>, Arc<DocumentDb>) {
        let store = Arc::new(ChunkStore::new());
        let backend = Arc::new(LinearScanIndex::new(store, 50));
        let retriever = Arc::new(Retriever::new(backend.clone(), backend));
        let db = Arc::new(DocumentDb::in_memory().unwrap());
        let gateway = EmbeddingGateway::new(
            Arc::new(HashEmbedder),
            &EmbeddingConfig {
                dimensions: 2,
                batch_size: 100,
                batch_delay_ms: 0,
            },
        );
        let pipeline = IngestPipeline::new(
            Chunker::from_config(&ChunkingConfig::default()),
            gateway,
            retriever.clone(),
            db.clone(),
        );
        (pipeline, retriever, db)
    }

    #[tokio::test]
    async fn ingest_registers_and_indexes_the_document() {
        let (pipeline, retriever, db) = pipeline();
        let pages = vec![Page::new(1, "First paragraph.\n\nSecond paragraph.", 0)];

        let record = pipeline.ingest_pages("report.pdf", &pages, 1).await.unwrap();

        assert!(record.doc_id.starts_with("doc-"));
        assert!(record.chunk_count > 0);
        assert!(db.get_document(&record.doc_id).unwrap().is_some());

        let outcome = retriever
            .search(&record.doc_id, &[10.0, 1.0], 3)
            .await
            .unwrap();
        assert!(!outcome.chunks.is_empty());
    }

    #[tokio::test]
    async fn empty_pages_are_registered_with_zero_chunks() {
        let (pipeline, retriever, db) = pipeline();
        let pages = vec![Page::new(1, "", 0)];

        let record = pipeline.ingest_pages("blank.pdf", &pages, 1).await.unwrap();

        assert_eq!(record.chunk_count, 0);
        assert!(db.get_document(&record.doc_id).unwrap().is_some());

        let outcome = retriever
            .search(&record.doc_id, &[1.0, 1.0], 3)
            .await
            .unwrap();
        assert!(outcome.chunks.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_registry_entry_and_index_records() {
        let (pipeline, retriever, db) = pipeline();
        let pages = vec![Page::new(1, "Some content to index.", 0)];
        let record = pipeline.ingest_pages("doc.pdf", &pages, 1).await.unwrap();

        pipeline.delete_document(&record.doc_id).await.unwrap();

        assert!(db.get_document(&record.doc_id).unwrap().is_none());
        let outcome = retriever
            .search(&record.doc_id, &[1.0, 1.0], 3)
            .await
            .unwrap();
        assert!(outcome.chunks.is_empty());
    }

    #[tokio::test]
    async fn deleting_an_unknown_document_is_an_error() {
        let (pipeline, _, _) = pipeline();
        let err = pipeline.delete_document("doc-missing").await.unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }
}
