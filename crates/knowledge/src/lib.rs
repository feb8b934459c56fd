//! Retrieval pipeline for grounded question answering.
//!
//! Chunks a document corpus, embeds the chunks into a persistent cosine
//! collection, retrieves the top-k chunks for a question and hands them to a
//! language model through the prompt assembler.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod memory_index;
pub mod rag;
pub mod retriever;
pub mod sources;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{split, split_documents, ChunkParams};
pub use embeddings::{create_embedder, Embedder, OllamaEmbedder, TrigramEmbedder};
pub use index::SqliteIndex;
pub use memory_index::MemoryIndex;
pub use rag::{Answerer, LlmAnswerer, RagAnswer, RagPipeline};
pub use retriever::Retriever;
pub use sources::{corpus_fingerprint, load_documents, SourceConfig};
pub use types::{
    Chunk, CollectionStats, IndexEntry, IngestReport, RetrievalHit, RetrievalResult,
    SourceDocument,
};
pub use vector_index::{cosine_similarity, VectorIndex};

use insight_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Open the configured collection, creating its database if needed.
pub fn open_index(config: &AppConfig) -> AppResult<Arc<SqliteIndex>> {
    let path = config::get_index_path(&config.workspace, &config.knowledge.collection);
    Ok(Arc::new(SqliteIndex::open(&path, &config.knowledge.collection)?))
}

/// Open the configured collection, failing if it was never created.
fn open_existing_index(config: &AppConfig) -> AppResult<Arc<SqliteIndex>> {
    let collection = &config.knowledge.collection;
    let path = config::get_index_path(&config.workspace, collection);
    if !path.exists() {
        return Err(AppError::Storage(format!(
            "Collection '{}' has no index. Run 'insight ingest' first.",
            collection
        )));
    }
    open_index(config)
}

/// Build the retriever for the configured collection and embedder.
pub fn build_retriever(config: &AppConfig) -> AppResult<Retriever> {
    let index = open_index(config)?;
    let embedder = create_embedder(&config.knowledge.embedding)?;
    Ok(Retriever::new(index, embedder))
}

/// Ingest the configured data directory.
///
/// With `reset`, the collection is rebuilt from the corpus; the previous
/// entries stay in place until the new ones are embedded. Otherwise a
/// populated collection is left untouched.
pub async fn ingest(config: &AppConfig, reset: bool) -> AppResult<IngestReport> {
    let params = ChunkParams::from_config(&config.knowledge)?;
    let retriever = build_retriever(config)?;

    let data_dir = config.data_dir();
    tracing::info!(
        "Starting ingestion of {:?} into '{}'",
        data_dir,
        config.knowledge.collection
    );

    let documents = load_documents(&data_dir, &SourceConfig::from(&config.knowledge))?;
    if reset {
        retriever.rebuild(&documents, params).await
    } else {
        retriever.ingest(&documents, params).await
    }
}

/// Retrieve the top-k chunks for `question` without calling the model.
pub async fn retrieve(config: &AppConfig, question: &str, k: usize) -> AppResult<RetrievalResult> {
    build_retriever(config)?.answer_context(question, k).await
}

/// Build the full RAG pipeline for the configured collection and provider.
pub fn build_pipeline(config: &AppConfig, top_k: usize) -> AppResult<RagPipeline> {
    let retriever = build_retriever(config)?;
    let answerer = Arc::new(LlmAnswerer::from_config(config)?);
    let template = insight_prompt::load_prompt_or_default(&config.workspace)?;
    Ok(RagPipeline::new(retriever, answerer, template, top_k))
}

/// Get statistics for the configured collection.
pub fn stats(config: &AppConfig) -> AppResult<CollectionStats> {
    open_existing_index(config)?.stats()
}

/// Remove every entry from the configured collection.
pub fn clean(config: &AppConfig) -> AppResult<()> {
    tracing::info!("Cleaning collection '{}'", config.knowledge.collection);
    open_existing_index(config)?.reset()
}
