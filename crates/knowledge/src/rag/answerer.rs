//! Answerer: the language-model side of the pipeline.

use async_trait::async_trait;
use insight_core::{AppConfig, AppError, AppResult};
use insight_llm::{create_client, ClientOptions, LlmClient, LlmRequest};
use std::sync::Arc;

/// Sampling temperature when the provider config does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Turns a `(system, user)` prompt pair into answer text.
///
/// Failures surface as `AppError::AnswererUnavailable`.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn invoke(&self, system: &str, user: &str) -> AppResult<String>;
}

/// Answerer backed by any [`LlmClient`].
pub struct LlmAnswerer {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmAnswerer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build an answerer for the configured provider and model.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let provider_config = config.get_provider_config(&config.provider);

        let options = ClientOptions {
            endpoint: provider_config
                .and_then(|pc| pc.endpoint())
                .map(str::to_string),
            api_key: config.resolve_api_key(&config.provider),
            timeout_secs: provider_config.and_then(|pc| pc.timeout()),
        };

        let client = create_client(&config.provider, &options)?;
        let temperature = provider_config
            .and_then(|pc| pc.temperature())
            .unwrap_or(DEFAULT_TEMPERATURE);

        tracing::debug!(
            "Answerer: provider {}, model {}, temperature {}",
            config.provider,
            config.model,
            temperature
        );

        Ok(Self::new(client, &config.model).with_temperature(temperature))
    }
}

#[async_trait]
impl Answerer for LlmAnswerer {
    async fn invoke(&self, system: &str, user: &str) -> AppResult<String> {
        let mut request = LlmRequest::new(user, &self.model)
            .with_system(system)
            .with_temperature(self.temperature);

        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.client.complete(&request).await.map_err(|e| match e {
            AppError::AnswererUnavailable(_) => e,
            other => AppError::AnswererUnavailable(other.to_string()),
        })?;

        tracing::debug!(
            "{} answered with {} tokens",
            self.client.provider_name(),
            response.usage.completion_tokens
        );

        Ok(response.content)
    }
}
