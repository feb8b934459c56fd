//! End-to-end retrieval and answering scenarios.

use super::stubs::{EchoAnswerer, FixedEmbedder, OfflineEmbedder};
use crate::chunker::ChunkParams;
use crate::embeddings::TrigramEmbedder;
use crate::memory_index::MemoryIndex;
use crate::rag::RagPipeline;
use crate::retriever::Retriever;
use crate::types::SourceDocument;
use crate::vector_index::VectorIndex;
use insight_core::{AppConfig, AppError};
use insight_prompt::{PromptTemplate, DEFAULT_SYSTEM_INSTRUCTION};
use std::sync::Arc;
use tempfile::TempDir;

const INFLATION: &str = "Ghana's inflation rate fell to 18% in May 2025.";

fn params() -> ChunkParams {
    ChunkParams::new(500, 50).unwrap()
}

fn trigram_retriever(collection: &str) -> Retriever {
    Retriever::new(
        Arc::new(MemoryIndex::new(collection)),
        Arc::new(TrigramEmbedder::new(384).unwrap()),
    )
}

#[tokio::test]
async fn test_single_fact_corpus_grounds_the_answer() {
    let retriever = trigram_retriever("ml_publications");
    let docs = vec![SourceDocument::new("publications.json#0", INFLATION)];

    let report = retriever.ingest(&docs, params()).await.unwrap();
    assert_eq!(report.chunks_count, 1);

    let context = retriever
        .answer_context("What is Ghana's inflation rate?", 1)
        .await
        .unwrap();
    assert_eq!(context.texts().collect::<Vec<_>>(), vec![INFLATION]);

    let answerer = Arc::new(EchoAnswerer::default());
    let pipeline = RagPipeline::new(retriever, answerer.clone(), PromptTemplate::default(), 1);
    let answer = pipeline
        .retrieve_and_answer("What is Ghana's inflation rate?")
        .await
        .unwrap();

    assert!(answer.prompt.user.contains(INFLATION));
    assert!(answer.answer.contains(INFLATION));
    assert_eq!(answer.context, context);

    let seen = answerer.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, DEFAULT_SYSTEM_INSTRUCTION);
    assert!(seen[0].1.contains("Question: What is Ghana's inflation rate?"));
}

#[tokio::test]
async fn test_empty_corpus_query_fails() {
    let retriever = trigram_retriever("empty");
    let report = retriever.ingest(&[], params()).await.unwrap();
    assert_eq!(report.entries_added, 0);

    let result = retriever.answer_context("anything", 4).await;
    assert!(matches!(result, Err(AppError::EmptyCollection(name)) if name == "empty"));

    let pipeline = RagPipeline::new(
        retriever,
        Arc::new(EchoAnswerer::default()),
        PromptTemplate::default(),
        4,
    );
    assert!(matches!(
        pipeline.retrieve_and_answer("anything").await,
        Err(AppError::EmptyCollection(_))
    ));
}

#[tokio::test]
async fn test_identical_embedding_ranks_first() {
    let embedder = FixedEmbedder::new(vec![0.0, 0.0, 1.0])
        .with("close one", vec![0.9, 0.1, 0.0])
        .with("exact match", vec![1.0, 0.0, 0.0])
        .with("close two", vec![0.95, 0.05, 0.0])
        .with("the question", vec![1.0, 0.0, 0.0]);
    let retriever = Retriever::new(Arc::new(MemoryIndex::new("ranked")), Arc::new(embedder));

    let docs = vec![
        SourceDocument::new("a", "close one"),
        SourceDocument::new("b", "exact match"),
        SourceDocument::new("c", "close two"),
        SourceDocument::new("d", "unrelated"),
    ];
    retriever.ingest(&docs, params()).await.unwrap();

    let result = retriever.answer_context("the question", 3).await.unwrap();
    assert_eq!(
        result.texts().collect::<Vec<_>>(),
        vec!["exact match", "close two", "close one"]
    );
    assert!((result.hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_same_corpus_same_count() {
    let docs: Vec<SourceDocument> = (0..5)
        .map(|i| {
            SourceDocument::new(
                format!("report.json#{}", i),
                format!("Quarter {} saw GDP growth of {}.{}%. ", i, i + 3, i).repeat(30),
            )
        })
        .collect();
    let params = ChunkParams::new(200, 20).unwrap();

    let first = trigram_retriever("first");
    let second = trigram_retriever("second");
    first.ingest(&docs, params).await.unwrap();
    second.ingest(&docs, params).await.unwrap();

    let count = first.index().count().unwrap();
    assert!(count > docs.len());
    assert_eq!(count, second.index().count().unwrap());

    let rerun = first.ingest(&docs, params).await.unwrap();
    assert!(rerun.skipped);
    assert_eq!(first.index().count().unwrap(), count);
}

#[tokio::test]
async fn test_embedder_outage_is_typed() {
    let retriever = Retriever::new(Arc::new(MemoryIndex::new("down")), Arc::new(OfflineEmbedder));

    let err = retriever
        .ingest(&[SourceDocument::new("a", INFLATION)], params())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmbeddingUnavailable(_)));
    assert!(err.is_transient());
    assert_eq!(retriever.index().count().unwrap(), 0);
}

#[tokio::test]
async fn test_query_embedder_dimension_mismatch() {
    let index = Arc::new(MemoryIndex::new("dims"));
    index
        .add(&[(INFLATION.to_string(), vec![1.0, 0.0])])
        .unwrap();

    let retriever = Retriever::new(index, Arc::new(TrigramEmbedder::new(384).unwrap()));
    let result = retriever.answer_context("inflation", 1).await;
    assert!(matches!(
        result,
        Err(AppError::DimensionMismatch {
            expected: 2,
            actual: 384
        })
    ));
}

fn workspace_config(temp: &TempDir) -> AppConfig {
    let data_dir = temp.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(
        data_dir.join("publications.json"),
        format!(
            r#"[
                {{"title": "CPI", "publication_description": "{}"}},
                {{"title": "MPC", "publication_description": "The policy rate was held at 28%."}}
            ]"#,
            INFLATION
        ),
    )
    .unwrap();

    AppConfig {
        workspace: temp.path().to_path_buf(),
        provider: "ollama".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_persistent_ingest_and_retrieve() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(&temp);

    let report = crate::ingest(&config, false).await.unwrap();
    assert_eq!(report.documents_count, 2);
    assert_eq!(report.entries_added, 2);

    let again = crate::ingest(&config, false).await.unwrap();
    assert!(again.skipped);

    let stats = crate::stats(&config).unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.dimension, Some(384));
    assert_eq!(stats.metric, "cosine");
    assert!(stats.fingerprint.is_some());

    let result = crate::retrieve(&config, "What is Ghana's inflation rate?", 1)
        .await
        .unwrap();
    assert_eq!(result.hits[0].text, INFLATION);

    let rebuilt = crate::ingest(&config, true).await.unwrap();
    assert!(!rebuilt.skipped);
    assert_eq!(rebuilt.collection_count, 2);
}

#[tokio::test]
async fn test_clean_then_query_is_empty_collection() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(&temp);

    assert!(crate::stats(&config).is_err());

    crate::ingest(&config, false).await.unwrap();
    crate::clean(&config).unwrap();

    assert_eq!(crate::stats(&config).unwrap().count, 0);
    assert!(matches!(
        crate::retrieve(&config, "inflation", 4).await,
        Err(AppError::EmptyCollection(_))
    ));
}

#[tokio::test]
async fn test_malformed_chunk_config_rejected_before_work() {
    let temp = TempDir::new().unwrap();
    let mut config = workspace_config(&temp);
    config.knowledge.chunk_overlap = config.knowledge.chunk_size;

    assert!(matches!(
        crate::ingest(&config, false).await,
        Err(AppError::MalformedChunkParameters(_))
    ));
    let knowledge = &config.knowledge;
    assert!(!crate::config::get_index_path(&config.workspace, &knowledge.collection).exists());
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_collection() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(&temp);
    crate::ingest(&config, false).await.unwrap();

    std::fs::write(temp.path().join("data").join("zz_bad.json"), "[{").unwrap();
    assert!(matches!(
        crate::ingest(&config, true).await,
        Err(AppError::Serialization(_))
    ));

    assert_eq!(crate::stats(&config).unwrap().count, 2);
    let result = crate::retrieve(&config, "What is Ghana's inflation rate?", 1)
        .await
        .unwrap();
    assert_eq!(result.hits[0].text, INFLATION);
}

#[tokio::test]
async fn test_rebuild_during_embedder_outage_keeps_entries() {
    let retriever = trigram_retriever("outage");
    let docs = vec![SourceDocument::new("a", INFLATION)];
    retriever.ingest(&docs, params()).await.unwrap();

    let offline = Retriever::new(retriever.index().clone(), Arc::new(OfflineEmbedder));
    let err = offline.rebuild(&docs, params()).await.unwrap_err();
    assert!(matches!(err, AppError::EmbeddingUnavailable(_)));

    assert_eq!(retriever.index().count().unwrap(), 1);
    let context = retriever.answer_context("inflation", 1).await.unwrap();
    assert_eq!(context.hits[0].text, INFLATION);
}
