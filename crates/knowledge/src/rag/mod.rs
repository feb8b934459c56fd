//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Grounds a language-model answer in the chunks retrieved for a question.

pub mod answerer;
pub mod pipeline;

pub use answerer::{Answerer, LlmAnswerer, DEFAULT_TEMPERATURE};
pub use pipeline::{RagAnswer, RagPipeline};
