//! Ingest command handler.
//!
//! Loads the corpus directory into the configured collection.

use anyhow::Context;
use clap::Args;
use insight_core::config::AppConfig;
use std::path::PathBuf;

/// Chunk, embed and index the corpus
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Corpus directory (default: knowledge.dataDir from config)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Empty the collection first and rebuild it
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ingest command");

        let mut config = config.clone();
        if let Some(ref data) = self.data {
            config.knowledge.data_dir = data.clone();
        }

        let report = insight_knowledge::ingest(&config, self.reset)
            .await
            .with_context(|| {
                format!(
                    "Failed to ingest {:?} into '{}'",
                    config.data_dir(),
                    config.knowledge.collection
                )
            })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.skipped {
            println!(
                "Collection '{}' already holds {} entries; nothing to do (use --reset to rebuild)",
                report.collection, report.collection_count
            );
        } else {
            println!(
                "Ingested {} documents ({} chunks) into '{}' in {:.2}s",
                report.documents_count,
                report.entries_added,
                report.collection,
                report.duration_secs
            );
        }

        Ok(())
    }
}
