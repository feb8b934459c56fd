//! Retrieve, assemble, answer.

use crate::rag::answerer::Answerer;
use crate::retriever::Retriever;
use crate::types::RetrievalResult;
use insight_core::AppResult;
use insight_prompt::{build_prompt, Prompt, PromptTemplate};
use serde::Serialize;
use std::sync::Arc;

/// A grounded answer and the context it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub context: RetrievalResult,
    #[serde(skip_serializing)]
    pub prompt: Prompt,
}

/// The full question-answering path over one collection.
pub struct RagPipeline {
    retriever: Retriever,
    answerer: Arc<dyn Answerer>,
    template: PromptTemplate,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(
        retriever: Retriever,
        answerer: Arc<dyn Answerer>,
        template: PromptTemplate,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            answerer,
            template,
            top_k,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Assemble the prompt for `question` from already retrieved context.
    pub fn assemble(&self, retrieved: &RetrievalResult, question: &str) -> AppResult<Prompt> {
        build_prompt(&self.template, retrieved.texts(), question)
    }

    /// Retrieve the top-k context for `question` and ask the answerer.
    ///
    /// An empty or unreachable collection is an error, never a canned
    /// "no information" answer.
    pub async fn retrieve_and_answer(&self, question: &str) -> AppResult<RagAnswer> {
        let context = self.retriever.answer_context(question, self.top_k).await?;
        let prompt = self.assemble(&context, question)?;

        tracing::debug!("Prompt user message: {} bytes", prompt.user.len());

        let answer = self.answerer.invoke(&prompt.system, &prompt.user).await?;

        Ok(RagAnswer {
            answer,
            context,
            prompt,
        })
    }
}
