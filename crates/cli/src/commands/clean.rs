//! Clean command handler.

use clap::Args;
use insight_core::config::AppConfig;

/// Remove every entry from the collection
#[derive(Args, Debug)]
pub struct CleanCommand {}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing clean command");

        insight_knowledge::clean(config)?;
        println!("Collection '{}' cleaned", config.knowledge.collection);

        Ok(())
    }
}
