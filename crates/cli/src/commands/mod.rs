//! Command handlers for the Strata CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod infer;
pub mod run;
pub mod schema;
pub mod stats;

// Re-export command types for convenience
pub use infer::InferCommand;
pub use run::RunCommand;
pub use schema::SchemaCommand;
pub use stats::StatsCommand;
