//! Ask command handler.
//!
//! Answers a question grounded in the retrieved context.

use super::retry::with_retry;
use anyhow::Context;
use clap::Args;
use insight_core::config::AppConfig;
use insight_knowledge::types::entry_label;

/// Ask a question about the ingested publications
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (default: knowledge.topK from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Question: {}", self.question);

        let top_k = self.top_k.unwrap_or(config.knowledge.top_k);
        let pipeline = insight_knowledge::build_pipeline(config, top_k)
            .context("Failed to set up the answering pipeline")?;

        let answer = with_retry(|| pipeline.retrieve_and_answer(&self.question))
            .await
            .context("Failed to answer the question")?;

        if self.json {
            let context: Vec<_> = answer
                .context
                .hits
                .iter()
                .map(|hit| {
                    serde_json::json!({
                        "id": entry_label(hit.id),
                        "score": hit.score,
                        "text": hit.text,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "answer": answer.answer,
                "provider": config.provider,
                "model": config.model,
                "context": context,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.answer);

            if tracing::enabled!(tracing::Level::DEBUG) {
                for hit in &answer.context.hits {
                    tracing::debug!("Context {} (score {:.3})", entry_label(hit.id), hit.score);
                }
            }
        }

        Ok(())
    }
}
