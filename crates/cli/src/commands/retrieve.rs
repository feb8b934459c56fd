//! Retrieve command handler.
//!
//! Shows the chunks a question would be grounded on, without calling the model.

use super::retry::with_retry;
use anyhow::Context;
use clap::Args;
use insight_core::config::AppConfig;
use insight_knowledge::types::entry_label;

/// Show the top-k chunks for a question
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub question: String,

    /// Number of chunks to retrieve (default: knowledge.topK from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing retrieve command");

        let top_k = self.top_k.unwrap_or(config.knowledge.top_k);
        let retriever = insight_knowledge::build_retriever(config)?;
        let result = with_retry(|| retriever.answer_context(&self.question, top_k))
            .await
            .context("Failed to retrieve context")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else if result.is_empty() {
            println!("No chunks requested (k = 0)");
        } else {
            for (rank, hit) in result.hits.iter().enumerate() {
                println!("{}. {} (score {:.3})", rank + 1, entry_label(hit.id), hit.score);
                println!("   {}", hit.text.trim().replace('\n', "\n   "));
            }
        }

        Ok(())
    }
}
