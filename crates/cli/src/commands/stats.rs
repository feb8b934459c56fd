//! Stats command handler.

use clap::Args;
use insight_core::config::AppConfig;

/// Show collection statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing stats command");

        let stats = insight_knowledge::stats(config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Collection: {}", stats.name);
            println!("  Entries: {}", stats.count);
            println!("  Metric: {}", stats.metric);
            match stats.dimension {
                Some(dimension) => println!("  Dimension: {}", dimension),
                None => println!("  Dimension: (not established)"),
            }
            if let Some(size) = stats.size_bytes {
                println!("  DB size: {} bytes", size);
            }
            if let Some(last) = stats.last_ingested_at {
                println!("  Last ingested: {}", last.to_rfc3339());
            }
            if let Some(ref fingerprint) = stats.fingerprint {
                println!("  Corpus fingerprint: {}", fingerprint);
            }
        }

        Ok(())
    }
}
