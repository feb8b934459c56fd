//! Embedder trait and factory.

use super::providers::{OllamaEmbedder, TrigramEmbedder};
use insight_core::config::EmbeddingConfig;
use insight_core::{AppError, AppResult};
use std::sync::Arc;

/// Maps text to fixed-length vectors.
///
/// Every vector an embedder returns has `dimensions()` entries. Failures
/// surface as `AppError::EmbeddingUnavailable`.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, one vector per text, in order.
    async fn embed_documents(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_documents(&[text.to_string()]).await?;
        results.pop().ok_or_else(|| {
            AppError::EmbeddingUnavailable(format!(
                "{} returned no embedding for the query",
                self.provider_name()
            ))
        })
    }
}

/// Create an embedder based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> AppResult<Arc<dyn Embedder>> {
    if config.dimensions == 0 {
        return Err(AppError::Config(
            "Embedding dimensions must be positive".to_string(),
        ));
    }

    match config.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(config.dimensions)?)),

        "ollama" => Ok(Arc::new(OllamaEmbedder::from_config(config)?)),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            config.provider
        ))),
    }
}
