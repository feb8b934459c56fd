//! LLM provider factory.
//!
//! Creates LLM clients from a provider name plus the endpoint, key and
//! timeout resolved from application configuration.

use crate::client::LlmClient;
use crate::providers::{GroqClient, OllamaClient};
use insight_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Connection options resolved by the caller.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// API key (required by hosted providers)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "ollama")
/// * `options` - Endpoint, API key and timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = options.timeout_secs.map(Duration::from_secs);

    match provider.to_lowercase().as_str() {
        "groq" => {
            let api_key = options.api_key.as_deref().ok_or_else(|| {
                AppError::Config(
                    "Groq provider requires an API key (set GROQ_API_KEY)".to_string(),
                )
            })?;
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::groq::DEFAULT_GROQ_URL);
            let client = GroqClient::with_base_url(base_url, api_key, timeout)?;
            Ok(Arc::new(client))
        }
        "ollama" => {
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::ollama::DEFAULT_OLLAMA_URL);
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
