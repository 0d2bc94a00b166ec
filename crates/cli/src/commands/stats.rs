//! Stats command handler.
//!
//! Handles processed document statistics display.

use clap::Args;
use strata_core::{config::AppConfig, AppResult};

/// Show processed document counts per schema version
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = strata_pipeline::open_store(config)?;
        let stats = strata_pipeline::store_stats(&store)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!(
            "{} processed documents across {} schema versions",
            stats.processed_documents, stats.schema_versions
        );
        for entry in &stats.documents_by_version {
            println!("  {:<6} {}", entry.version.to_string(), entry.documents);
        }

        Ok(())
    }
}
