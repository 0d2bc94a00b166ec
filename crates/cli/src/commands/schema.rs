//! Schema command handler.
//!
//! Reads version documents from the store; never mints a version.

use clap::{Args, Subcommand};
use strata_core::{config::AppConfig, AppError, AppResult};
use strata_schema::{SchemaStore, SchemaVersion, VersionId};

/// Inspect the schema version history
#[derive(Args, Debug)]
pub struct SchemaCommand {
    #[command(subcommand)]
    pub action: SchemaAction,
}

#[derive(Subcommand, Debug)]
pub enum SchemaAction {
    /// Show the latest schema version
    Latest(SchemaLatestCommand),
    /// List every schema version
    History(SchemaHistoryCommand),
    /// Show one schema version
    Show(SchemaShowCommand),
}

impl SchemaCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            SchemaAction::Latest(cmd) => cmd.execute(config).await,
            SchemaAction::History(cmd) => cmd.execute(config).await,
            SchemaAction::Show(cmd) => cmd.execute(config).await,
        }
    }
}

/// Show the latest schema version
#[derive(Args, Debug)]
pub struct SchemaLatestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SchemaLatestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing schema latest command");

        let store = strata_pipeline::open_store(config)?;
        let latest = store
            .latest_schema_version()
            .map_err(|e| AppError::Store(e.to_string()))?;

        match latest {
            Some(version) => print_version(&version, self.json),
            None => {
                println!("No schema version yet");
                Ok(())
            }
        }
    }
}

/// List every schema version
#[derive(Args, Debug)]
pub struct SchemaHistoryCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SchemaHistoryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing schema history command");

        let store = strata_pipeline::open_store(config)?;
        let versions = store
            .list_schema_versions()
            .map_err(|e| AppError::Store(e.to_string()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&versions)?);
            return Ok(());
        }

        if versions.is_empty() {
            println!("No schema version yet");
        }
        for version in &versions {
            println!(
                "{:<6} {}  {} nodes",
                version.version.to_string(),
                version.created_at.to_rfc3339(),
                version.schema.node_count()
            );
        }

        Ok(())
    }
}

/// Show one schema version
#[derive(Args, Debug)]
pub struct SchemaShowCommand {
    /// Version id, e.g. v3
    pub version: VersionId,
}

impl SchemaShowCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing schema show command for {}", self.version);

        let store = strata_pipeline::open_store(config)?;
        let version = store
            .get_schema_version(self.version)
            .map_err(|e| AppError::Store(e.to_string()))?
            .ok_or_else(|| {
                AppError::Store(format!("Schema version {} not found", self.version))
            })?;

        print_version(&version, true)
    }
}

fn print_version(version: &SchemaVersion, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(version)?);
    } else {
        println!("{} (created {})", version.version, version.created_at.to_rfc3339());
        println!("{}", serde_json::to_string_pretty(&version.schema)?);
    }
    Ok(())
}
