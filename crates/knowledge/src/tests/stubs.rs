//! Deterministic collaborators for pipeline tests.

use crate::embeddings::Embedder;
use crate::rag::Answerer;
use insight_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Embedder with fixed vectors per text, and a fallback for anything else.
#[derive(Debug)]
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait::async_trait]
impl Embedder for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.fallback.len()
    }

    async fn embed_documents(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).unwrap_or(&self.fallback).clone())
            .collect())
    }
}

/// Embedder that is always down.
#[derive(Debug)]
pub struct OfflineEmbedder;

#[async_trait::async_trait]
impl Embedder for OfflineEmbedder {
    fn provider_name(&self) -> &str {
        "offline"
    }

    fn model_name(&self) -> &str {
        "offline"
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn embed_documents(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::EmbeddingUnavailable("connection refused".to_string()))
    }
}

/// Answerer that echoes the user message and remembers what it saw.
#[derive(Debug, Default)]
pub struct EchoAnswerer {
    pub seen: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl Answerer for EchoAnswerer {
    async fn invoke(&self, system: &str, user: &str) -> AppResult<String> {
        self.seen
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(user.to_string())
    }
}
