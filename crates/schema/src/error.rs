//! Error types for the document store seam.

use thiserror::Error;

use crate::version::VersionId;

/// Errors surfaced by a [`crate::SchemaStore`].
///
/// Every failure of `evolve` is one of these. All but one are propagated from
/// the store; the engine itself only reports `Corrupt` when the latest
/// version id leaves no room for a successor.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation failed
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An append was refused because the version already exists
    #[error("schema version {version} already exists")]
    VersionConflict { version: VersionId },

    /// A persisted record could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
