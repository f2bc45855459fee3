//! Embedding gateway: batched, rate-paced access to the embedding service
//!
//! Texts are embedded in fixed-size batches. Requests within a batch run
//! concurrently; a pacing delay separates batches so the remote service's
//! rate limits are respected. Any single failure aborts the whole call with
//! no partial results.

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// Batched gateway in front of an embedding provider
#[derive(Clone)]
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    /// Texts per batch
    batch_size: usize,
    /// Pacing delay inserted between batches
    batch_delay: Duration,
}

impl EmbeddingGateway {
    /// Create a gateway from configuration
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }

    /// Embedding dimensions of the underlying provider
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed many texts, preserving input order and count
    ///
    /// The output always has exactly one vector per input text; a single
    /// embedding failure fails the whole call.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_number, batch) in texts.chunks(self.batch_size).enumerate() {
            if batch_number > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            tracing::debug!(
                "Embedding batch {} ({} texts)",
                batch_number + 1,
                batch.len()
            );

            let batch_vectors = try_join_all(batch.iter().map(|text| self.provider.embed(text)))
                .await
                .map_err(as_embedding_fault)?;
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }

    /// Embed a single text
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.embed(text).await.map_err(as_embedding_fault)
    }
}

/// Ensure a failure surfaces as an embedding-service fault
fn as_embedding_fault(err: Error) -> Error {
    match err {
        Error::Embedding(_) => err,
        other => Error::Embedding(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic provider: embeds a text as [len, calls_so_far]
    struct StubProvider {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl StubProvider {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(call) == self.fail_on {
                return Err(Error::Embedding("stub failure".to_string()));
            }
            Ok(vec![text.len() as f32, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn gateway(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> EmbeddingGateway {
        EmbeddingGateway::new(
            provider,
            &EmbeddingConfig {
                dimensions: 2,
                batch_size,
                batch_delay_ms: 0,
            },
        )
    }

    #[tokio::test]
    async fn embed_many_preserves_order_and_count() {
        let gw = gateway(Arc::new(StubProvider::new(None)), 2);
        let texts: Vec<String> = vec!["a", "bb", "ccc", "dddd", "eeeee"]
            .into_iter()
            .map(String::from)
            .collect();

        let vectors = gw.embed_many(&texts).await.unwrap();

        assert_eq!(vectors.len(), texts.len());
        for (text, vector) in texts.iter().zip(&vectors) {
            assert_eq!(vector[0], text.len() as f32);
        }
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let gw = gateway(Arc::new(StubProvider::new(None)), 10);
        let vectors = gw.embed_many(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn single_failure_aborts_the_whole_call() {
        let gw = gateway(Arc::new(StubProvider::new(Some(3))), 2);
        let texts: Vec<String> = (0..6).map(|i| format!("text-{}", i)).collect();

        let err = gw.embed_many(&texts).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn embed_one_returns_a_single_vector() {
        let gw = gateway(Arc::new(StubProvider::new(None)), 10);
        let vector = gw.embed_one("hello").await.unwrap();
        assert_eq!(vector[0], 5.0);
    }
}
