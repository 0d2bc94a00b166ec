//! The document store seam and an in-memory implementation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::value::Value;
use crate::version::{SchemaVersion, VersionId};

/// A processed input record, persisted next to the schema versions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    pub id: String,
    pub source_file: String,
    pub processed_at: DateTime<Utc>,
    pub schema_version: VersionId,
    pub data: Value,
}

impl ProcessedDocument {
    pub fn new(source_file: impl Into<String>, schema_version: VersionId, data: Value) -> Self {
        ProcessedDocument {
            id: uuid::Uuid::new_v4().to_string(),
            source_file: source_file.into(),
            processed_at: Utc::now(),
            schema_version,
            data,
        }
    }
}

/// Persistence collaborator for schema versions and processed records.
///
/// Schema versions are append-only: `save_schema_version` must fail with
/// [`StoreError::VersionConflict`] rather than overwrite an existing id.
pub trait SchemaStore {
    /// The version with the greatest `created_at`, if any exists.
    fn latest_schema_version(&self) -> StoreResult<Option<SchemaVersion>>;

    /// Append a new, immutable version document.
    fn save_schema_version(&self, version: &SchemaVersion) -> StoreResult<()>;

    /// Persist a processed input record.
    fn save_processed_document(&self, doc: &ProcessedDocument) -> StoreResult<()>;
}

impl<S: SchemaStore + ?Sized> SchemaStore for &S {
    fn latest_schema_version(&self) -> StoreResult<Option<SchemaVersion>> {
        (**self).latest_schema_version()
    }

    fn save_schema_version(&self, version: &SchemaVersion) -> StoreResult<()> {
        (**self).save_schema_version(version)
    }

    fn save_processed_document(&self, doc: &ProcessedDocument) -> StoreResult<()> {
        (**self).save_processed_document(doc)
    }
}

/// A [`SchemaStore`] kept in memory.
///
/// Keeps every write so callers can inspect exactly what was persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    versions: Mutex<Vec<SchemaVersion>>,
    documents: Mutex<Vec<ProcessedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every version written so far, in write order.
    pub fn versions(&self) -> Vec<SchemaVersion> {
        lock(&self.versions).map(|v| v.clone()).unwrap_or_default()
    }

    /// Every processed record written so far, in write order.
    pub fn documents(&self) -> Vec<ProcessedDocument> {
        lock(&self.documents).map(|d| d.clone()).unwrap_or_default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
}

impl SchemaStore for MemoryStore {
    fn latest_schema_version(&self) -> StoreResult<Option<SchemaVersion>> {
        let versions = lock(&self.versions)?;
        Ok(versions
            .iter()
            .max_by_key(|v| (v.created_at, v.version))
            .cloned())
    }

    fn save_schema_version(&self, version: &SchemaVersion) -> StoreResult<()> {
        let mut versions = lock(&self.versions)?;
        if versions.iter().any(|v| v.version == version.version) {
            return Err(StoreError::VersionConflict {
                version: version.version,
            });
        }
        versions.push(version.clone());
        Ok(())
    }

    fn save_processed_document(&self, doc: &ProcessedDocument) -> StoreResult<()> {
        lock(&self.documents)?.push(doc.clone());
        Ok(())
    }
}
