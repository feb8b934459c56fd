//! Retriever: idempotent ingestion and top-k context retrieval.

use crate::chunker::{split_documents, ChunkParams};
use crate::embeddings::Embedder;
use crate::sources::corpus_fingerprint;
use crate::types::{IngestReport, RetrievalResult, SourceDocument};
use crate::vector_index::VectorIndex;
use insight_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Instant;

/// Ties an embedder to one collection.
///
/// Read-only after construction; safe to share across queries.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("collection", &self.index.name())
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Chunk, embed and add `documents`, unless the collection already has
    /// entries.
    ///
    /// The emptiness check and the add are not atomic; only one ingester may
    /// run against a collection at a time.
    pub async fn ingest(
        &self,
        documents: &[SourceDocument],
        params: ChunkParams,
    ) -> AppResult<IngestReport> {
        let start = Instant::now();
        let collection = self.index.name().to_string();

        let existing = self.index.count()?;
        if existing > 0 {
            tracing::info!(
                "Collection '{}' already holds {} entries, skipping ingestion",
                collection,
                existing
            );

            if let Some(previous) = self.index.stats()?.fingerprint {
                if previous != corpus_fingerprint(documents) {
                    tracing::warn!(
                        "Corpus changed since '{}' was ingested; re-run with --reset to rebuild it",
                        collection
                    );
                }
            }

            return Ok(IngestReport {
                collection,
                documents_count: documents.len(),
                chunks_count: 0,
                entries_added: 0,
                skipped: true,
                collection_count: existing,
                duration_secs: start.elapsed().as_secs_f64(),
            });
        }

        tracing::info!(
            "Ingesting {} documents into '{}'",
            documents.len(),
            collection
        );

        let entries = self.embed_corpus(documents, params).await?;
        let chunks_count = entries.len();

        let ids = if entries.is_empty() {
            tracing::warn!("No chunks produced, nothing to add to '{}'", collection);
            vec![]
        } else {
            let ids = self.index.add(&entries)?;
            self.index.record_ingestion(&corpus_fingerprint(documents))?;
            ids
        };

        let duration = start.elapsed();
        tracing::info!(
            "Ingested {} chunks into '{}' in {:.2}s",
            ids.len(),
            collection,
            duration.as_secs_f64()
        );

        Ok(IngestReport {
            collection,
            documents_count: documents.len(),
            chunks_count,
            entries_added: ids.len(),
            skipped: false,
            collection_count: self.index.count()?,
            duration_secs: duration.as_secs_f64(),
        })
    }

    /// Replace the collection with `documents`, populated or not.
    ///
    /// Chunking and embedding finish before the collection is touched, so a
    /// failed rebuild leaves the previous entries queryable.
    pub async fn rebuild(
        &self,
        documents: &[SourceDocument],
        params: ChunkParams,
    ) -> AppResult<IngestReport> {
        let start = Instant::now();
        let collection = self.index.name().to_string();

        tracing::info!(
            "Rebuilding '{}' from {} documents",
            collection,
            documents.len()
        );

        let entries = self.embed_corpus(documents, params).await?;
        let ids = self
            .index
            .replace_all(&entries, &corpus_fingerprint(documents))?;

        Ok(IngestReport {
            collection,
            documents_count: documents.len(),
            chunks_count: entries.len(),
            entries_added: ids.len(),
            skipped: false,
            collection_count: self.index.count()?,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Chunk and embed `documents` into `(text, embedding)` pairs.
    async fn embed_corpus(
        &self,
        documents: &[SourceDocument],
        params: ChunkParams,
    ) -> AppResult<Vec<(String, Vec<f32>)>> {
        let texts: Vec<String> = split_documents(documents, params)
            .into_iter()
            .map(|c| c.text)
            .collect();
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let embeddings = self
            .embedder
            .embed_documents(&texts)
            .await
            .map_err(as_embedding_error)?;

        if embeddings.len() != texts.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.provider_name(),
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(texts.into_iter().zip(embeddings).collect())
    }

    /// Embed `query` and return the `k` most similar entries verbatim.
    pub async fn answer_context(&self, query: &str, k: usize) -> AppResult<RetrievalResult> {
        let embedding = self
            .embedder
            .embed_query(query)
            .await
            .map_err(as_embedding_error)?;

        let result = self.index.query(&embedding, k)?;

        tracing::info!(
            "Retrieved {} chunks from '{}' (top score: {:.3})",
            result.len(),
            self.index.name(),
            result.top_score().unwrap_or(0.0)
        );

        Ok(result)
    }
}

/// Embedder failures surface as `EmbeddingUnavailable`, except a dimension
/// disagreement which stays a configuration fault.
fn as_embedding_error(err: AppError) -> AppError {
    match err {
        AppError::EmbeddingUnavailable(_) | AppError::DimensionMismatch { .. } => err,
        other => AppError::EmbeddingUnavailable(other.to_string()),
    }
}
