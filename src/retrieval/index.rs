//! Vector index backends for chunk storage and similarity search
//!
//! Two interchangeable backends sit behind [`VectorIndexBackend`]: an HNSW
//! approximate-nearest-neighbor index (primary) and a brute-force linear scan
//! (fallback). Both read the same [`ChunkStore`], so a search served by the
//! fallback sees exactly the records the primary indexed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hnsw_rs::prelude::{DistCosine, Hnsw};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, ScoredChunk};

use super::similarity::cosine_similarity;

/// A chunk with its embedding as stored in the index
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    /// Owning document id
    pub doc_id: String,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Chunk text
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Positional metadata
    pub metadata: ChunkMetadata,
    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}

impl IndexedRecord {
    fn from_chunk(doc_id: &str, chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            embedding,
            metadata: chunk.metadata(),
            created_at: Utc::now(),
        }
    }

    fn scored(&self, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk_index: self.chunk_index,
            text: self.text.clone(),
            metadata: self.metadata,
            score,
        }
    }
}

/// Shared, concurrency-safe record store keyed by document id
///
/// Records for one document are kept in insertion order; upsert, search and
/// delete are each atomic with respect to other operations on the same id.
#[derive(Default)]
pub struct ChunkStore {
    records: DashMap<String, Vec<IndexedRecord>>,
}

impl ChunkStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records for a document, returning the position of the first
    fn append(&self, doc_id: &str, mut batch: Vec<IndexedRecord>) -> usize {
        let mut entry = self.records.entry(doc_id.to_string()).or_default();
        let base = entry.len();
        entry.append(&mut batch);
        base
    }

    /// Record at a given position within a document, if still present
    fn get(&self, doc_id: &str, position: usize) -> Option<IndexedRecord> {
        self.records
            .get(doc_id)
            .and_then(|records| records.get(position).cloned())
    }

    /// Up to `limit` records for a document, in storage order
    pub fn records_for(&self, doc_id: &str, limit: usize) -> Vec<IndexedRecord> {
        self.records
            .get(doc_id)
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every record for a document; idempotent
    pub fn delete_document(&self, doc_id: &str) -> usize {
        self.records
            .remove(doc_id)
            .map(|(_, records)| records.len())
            .unwrap_or(0)
    }

    /// Total number of stored records
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for vector storage and doc-filtered similarity search
#[async_trait]
pub trait VectorIndexBackend: Send + Sync {
    /// Store one record per chunk; fails when counts mismatch
    async fn upsert_document(
        &self,
        doc_id: &str,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
    ) -> Result<()>;

    /// Top-k most similar chunks of a document, descending by score
    async fn search(&self, doc_id: &str, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Remove all records for a document; deleting an unknown id is not an error
    async fn delete_document(&self, doc_id: &str) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

fn check_counts(doc_id: &str, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != vectors.len() {
        return Err(Error::invalid_input(format!(
            "Chunk/embedding count mismatch for {}: {} chunks, {} vectors",
            doc_id,
            chunks.len(),
            vectors.len()
        )));
    }
    Ok(())
}

/// Primary backend: HNSW approximate-nearest-neighbor index
///
/// The graph lives in memory; the shared [`ChunkStore`] is the source of
/// truth for record data. Deletions are handled by dropping the id mapping,
/// so stale graph points are filtered out at search time. The candidate pool
/// requested from the graph is `top_k * candidate_multiplier` to improve
/// recall before truncation.
pub struct HnswIndex {
    store: Arc<ChunkStore>,
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Graph point id -> (doc id, position in the store)
    id_map: DashMap<usize, (String, usize)>,
    next_id: AtomicUsize,
    dimensions: usize,
    ef_search: usize,
    candidate_multiplier: usize,
}

impl HnswIndex {
    /// Create a new HNSW index over the given store
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<ChunkStore>,
        dimensions: usize,
        m: usize,
        ef_construction: usize,
        ef_search: usize,
        max_elements: usize,
        candidate_multiplier: usize,
    ) -> Self {
        let hnsw = Hnsw::new(m, max_elements, 16, ef_construction, DistCosine {});
        Self {
            store,
            hnsw,
            id_map: DashMap::new(),
            next_id: AtomicUsize::new(0),
            dimensions,
            ef_search,
            candidate_multiplier: candidate_multiplier.max(1),
        }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndexBackend for HnswIndex {
    async fn upsert_document(
        &self,
        doc_id: &str,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        check_counts(doc_id, chunks, vectors)?;
        for vector in vectors {
            self.check_dimensions(vector)?;
        }

        let records: Vec<IndexedRecord> = chunks
            .iter()
            .zip(vectors.iter())
            .map(|(chunk, vector)| IndexedRecord::from_chunk(doc_id, chunk, vector.clone()))
            .collect();

        let base = self.store.append(doc_id, records);

        for (offset, vector) in vectors.iter().enumerate() {
            let point_id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.hnsw.insert((vector, point_id));
            self.id_map
                .insert(point_id, (doc_id.to_string(), base + offset));
        }

        tracing::debug!("Indexed {} chunks for {}", chunks.len(), doc_id);
        Ok(())
    }

    async fn search(&self, doc_id: &str, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.check_dimensions(query)?;

        if self.id_map.is_empty() {
            return Ok(Vec::new());
        }

        let pool = top_k.saturating_mul(self.candidate_multiplier).max(top_k);
        let neighbours = self.hnsw.search(query, pool, self.ef_search.max(pool));

        let mut results = Vec::new();
        for neighbour in neighbours {
            let Some(entry) = self.id_map.get(&neighbour.d_id) else {
                // Point belonged to a deleted document
                continue;
            };
            let (owner, position) = entry.value().clone();
            if owner != doc_id {
                continue;
            }
            if let Some(record) = self.store.get(&owner, position) {
                // DistCosine is a distance; flip it back into a similarity
                results.push(record.scored(1.0 - neighbour.distance));
            }
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let deleted = self.store.delete_document(doc_id);
        self.id_map.retain(|_, (owner, _)| owner.as_str() != doc_id);
        if deleted > 0 {
            tracing::debug!("Deleted {} records for {}", deleted, doc_id);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "hnsw"
    }
}

/// Fallback backend: bounded brute-force scan scored with cosine similarity
///
/// Examines at most `scan_limit` records per document (a recall/latency
/// trade-off, not a correctness guarantee over large corpora). Ties in score
/// keep their storage order.
pub struct LinearScanIndex {
    store: Arc<ChunkStore>,
    scan_limit: usize,
}

impl LinearScanIndex {
    /// Create a linear-scan backend over the given store
    pub fn new(store: Arc<ChunkStore>, scan_limit: usize) -> Self {
        Self {
            store,
            scan_limit: scan_limit.max(1),
        }
    }
}

#[async_trait]
impl VectorIndexBackend for LinearScanIndex {
    async fn upsert_document(
        &self,
        doc_id: &str,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        check_counts(doc_id, chunks, vectors)?;

        let records: Vec<IndexedRecord> = chunks
            .iter()
            .zip(vectors.iter())
            .map(|(chunk, vector)| IndexedRecord::from_chunk(doc_id, chunk, vector.clone()))
            .collect();
        self.store.append(doc_id, records);
        Ok(())
    }

    async fn search(&self, doc_id: &str, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let records = self.store.records_for(doc_id, self.scan_limit);

        let mut results = Vec::with_capacity(records.len());
        for record in &records {
            let score = cosine_similarity(query, &record.embedding)?;
            results.push(record.scored(score));
        }

        // Stable sort keeps storage order on ties
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.store.delete_document(doc_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "linear-scan"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::ParagraphRange;

    pub(crate) fn make_chunk(index: u32, text: &str) -> Chunk {
        Chunk {
            chunk_index: index,
            text: text.to_string(),
            page: 1,
            paragraph_number: index + 1,
            paragraph_range: ParagraphRange::single(index + 1),
            start_char: 0,
            end_char: text.len(),
            chunk_length: text.len(),
        }
    }

    fn basis(dimensions: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dimensions];
        v[axis] = 1.0;
        v
    }

    #[tokio::test]
    async fn linear_scan_ranks_by_similarity() {
        let store = Arc::new(ChunkStore::new());
        let index = LinearScanIndex::new(store, 50);

        let chunks = vec![
            make_chunk(0, "north"),
            make_chunk(1, "east"),
            make_chunk(2, "north-east"),
        ];
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.7, 0.7],
        ];
        index.upsert_document("doc-1", &chunks, &vectors).await.unwrap();

        let results = index.search("doc-1", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "north");
        assert_eq!(results[1].text, "north-east");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn search_is_scoped_to_the_requested_document() {
        let store = Arc::new(ChunkStore::new());
        let index = LinearScanIndex::new(store, 50);

        index
            .upsert_document("doc-a", &[make_chunk(0, "alpha")], &[vec![1.0, 0.0]])
            .await
            .unwrap();
        index
            .upsert_document("doc-b", &[make_chunk(0, "beta")], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let results = index.search("doc-a", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "alpha");
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected_with_no_partial_write() {
        let store = Arc::new(ChunkStore::new());
        let index = LinearScanIndex::new(Arc::clone(&store), 50);

        let err = index
            .upsert_document("doc-1", &[make_chunk(0, "a"), make_chunk(1, "b")], &[vec![1.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_empties_search() {
        let store = Arc::new(ChunkStore::new());
        let index = LinearScanIndex::new(store, 50);

        index
            .upsert_document("doc-1", &[make_chunk(0, "text")], &[vec![1.0, 0.0]])
            .await
            .unwrap();
        index.delete_document("doc-1").await.unwrap();
        index.delete_document("doc-1").await.unwrap();

        let results = index.search("doc-1", &[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn scan_limit_bounds_the_candidate_set() {
        let store = Arc::new(ChunkStore::new());
        let index = LinearScanIndex::new(store, 5);

        // The best match sits beyond the scan cap and must not be found
        let mut chunks = Vec::new();
        let mut vectors = Vec::new();
        for i in 0..6u32 {
            chunks.push(make_chunk(i, &format!("chunk-{}", i)));
            vectors.push(if i == 5 { vec![1.0, 0.0] } else { vec![0.0, 1.0] });
        }
        index.upsert_document("doc-1", &chunks, &vectors).await.unwrap();

        let results = index.search("doc-1", &[1.0, 0.0], 6).await.unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.text != "chunk-5"));
    }

    #[tokio::test]
    async fn hnsw_index_finds_nearest_neighbours() {
        let dims = 8;
        let store = Arc::new(ChunkStore::new());
        let index = HnswIndex::new(Arc::clone(&store), dims, 16, 200, 100, 1000, 10);

        let chunks: Vec<Chunk> = (0..4).map(|i| make_chunk(i, &format!("axis-{}", i))).collect();
        let vectors: Vec<Vec<f32>> = (0..4).map(|i| basis(dims, i)).collect();
        index.upsert_document("doc-1", &chunks, &vectors).await.unwrap();

        let results = index.search("doc-1", &basis(dims, 2), 2).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 2);
        assert_eq!(results[0].text, "axis-2");
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn hnsw_index_excludes_other_documents() {
        let dims = 4;
        let store = Arc::new(ChunkStore::new());
        let index = HnswIndex::new(Arc::clone(&store), dims, 16, 200, 100, 1000, 10);

        index
            .upsert_document("doc-a", &[make_chunk(0, "a")], &[basis(dims, 0)])
            .await
            .unwrap();
        index
            .upsert_document("doc-b", &[make_chunk(0, "b")], &[basis(dims, 0)])
            .await
            .unwrap();

        let results = index.search("doc-a", &basis(dims, 0), 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "a");
    }

    #[tokio::test]
    async fn hnsw_delete_hides_stale_graph_points() {
        let dims = 4;
        let store = Arc::new(ChunkStore::new());
        let index = HnswIndex::new(Arc::clone(&store), dims, 16, 200, 100, 1000, 10);

        index
            .upsert_document("doc-1", &[make_chunk(0, "gone")], &[basis(dims, 0)])
            .await
            .unwrap();
        index.delete_document("doc-1").await.unwrap();

        let results = index.search("doc-1", &basis(dims, 0), 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn hnsw_rejects_wrong_dimensions() {
        let store = Arc::new(ChunkStore::new());
        let index = HnswIndex::new(store, 4, 16, 200, 100, 1000, 10);

        let err = index
            .upsert_document("doc-1", &[make_chunk(0, "a")], &[vec![1.0, 0.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
