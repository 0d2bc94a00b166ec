//! Run command handler.
//!
//! Runs the ingestion pipeline once over the raw directory.

use clap::Args;
use std::path::PathBuf;
use strata_core::{config::AppConfig, AppResult};

/// Process every file in the raw directory
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Raw input directory (overrides the configured one)
    #[arg(long, env = "STRATA_RAW_DIR")]
    pub raw_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing run command");

        let mut config = config.clone();
        if let Some(raw_dir) = &self.raw_dir {
            config.raw_dir = raw_dir.clone();
        }
        config.ensure_strata_dir()?;

        let stats = strata_pipeline::run(&config).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!(
            "Processed {} of {} files ({} skipped, {} failed) in {:.2}s",
            stats.processed, stats.discovered, stats.skipped, stats.failed, stats.duration_secs
        );
        match stats.latest_version {
            Some(version) => println!(
                "{} new schema version(s), latest is {}",
                stats.versions_created, version
            ),
            None => println!("No schema version yet"),
        }

        Ok(())
    }
}
