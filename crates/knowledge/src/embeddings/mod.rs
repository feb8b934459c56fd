//! Embedding providers.
//!
//! The pipeline only sees the [`Embedder`] trait; the concrete provider is
//! picked from the `knowledge.embedding` section of the configuration.

pub mod provider;
pub mod providers;

pub use provider::{create_embedder, Embedder};
pub use providers::{OllamaEmbedder, TrigramEmbedder};
