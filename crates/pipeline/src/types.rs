//! Pipeline type definitions.

use serde::Serialize;
use strata_schema::VersionId;

/// Statistics from a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Candidate files found in the raw directory
    pub discovered: usize,

    /// Files evolved, recorded and moved to the processed directory
    pub processed: usize,

    /// Files no reader could make sense of
    pub skipped: usize,

    /// Files that failed and were left in place
    pub failed: usize,

    /// Schema versions minted during this run
    pub versions_created: usize,

    /// Latest schema version known at the end of the run
    pub latest_version: Option<VersionId>,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Per-version breakdown of the processed records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub schema_versions: usize,
    pub processed_documents: u64,
    pub documents_by_version: Vec<VersionCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionCount {
    pub version: VersionId,
    pub documents: u64,
}
