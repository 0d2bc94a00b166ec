//! Infer command handler.

use clap::Args;
use std::path::PathBuf;
use strata_core::{AppError, AppResult};

/// Print the inferred schema of a single file
#[derive(Args, Debug)]
pub struct InferCommand {
    /// File to read
    pub file: PathBuf,
}

impl InferCommand {
    pub async fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing infer command for {:?}", self.file);

        let schema = strata_pipeline::infer_file(&self.file)?
            .ok_or_else(|| AppError::Parse(format!("No reader handles {:?}", self.file)))?;

        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
