//! Ollama embedding provider.
//!
//! Calls the local Ollama API (`POST /api/embeddings`) once per text with a
//! model such as `nomic-embed-text`. Requests are not retried here; callers
//! decide whether an `EmbeddingUnavailable` failure is worth another attempt.

use crate::embeddings::Embedder;
use async_trait::async_trait;
use insight_core::config::EmbeddingConfig;
use insight_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Request timeout when the config does not set one
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using the local API
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaEmbedder {
    /// Create a provider from embedding configuration.
    ///
    /// No request is made here; an unreachable server shows up on the first
    /// embed call.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS));
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::EmbeddingUnavailable(format!(
                    "Ollama not reachable at {}: {}. Ensure Ollama is running and run: ollama pull {}",
                    self.base_url, e, self.model
                ))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::EmbeddingUnavailable(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        if body.embedding.len() != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: body.embedding.len(),
            });
        }

        Ok(body.embedding)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_documents(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts", texts.len());

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_single(text).await?);
        }

        Ok(embeddings)
    }
}
