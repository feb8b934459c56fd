//! Concrete LLM provider clients.

pub mod groq;
pub mod ollama;

pub use groq::GroqClient;
pub use ollama::OllamaClient;

use insight_core::AppError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to an error.
///
/// Rate limits and server errors mean the answerer is unavailable; other
/// client errors are final.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> AppError {
    match status {
        s if s == StatusCode::TOO_MANY_REQUESTS
            || s == StatusCode::REQUEST_TIMEOUT
            || s.is_server_error() =>
        {
            AppError::AnswererUnavailable(format!("{} API error ({}): {}", provider, status, body))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Config(format!(
            "{} rejected the API key ({}): {}",
            provider, status, body
        )),
        _ => AppError::Other(format!("{} API error ({}): {}", provider, status, body)),
    }
}
