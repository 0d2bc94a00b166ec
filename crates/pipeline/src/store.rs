//! SQLite-backed document store for schema versions and processed records.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use strata_core::{AppError, AppResult};
use strata_schema::{
    ProcessedDocument, SchemaNode, SchemaStore, SchemaVersion, StoreError, StoreResult, VersionId,
};

/// A [`SchemaStore`] persisted in a single SQLite file.
///
/// Version documents are append-only; the `version_number` primary key
/// refuses a second write of the same id.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Store(format!("Failed to create store directory: {}", e)))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Store(format!("Failed to open SQLite store: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                version_number INTEGER PRIMARY KEY,
                version TEXT NOT NULL UNIQUE,
                schema TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS processed_documents (
                id TEXT PRIMARY KEY,
                source_file TEXT NOT NULL,
                processed_at TEXT NOT NULL,
                schema_version TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_schema_versions_created
                ON schema_versions(created_at);
            CREATE INDEX IF NOT EXISTS idx_documents_version
                ON processed_documents(schema_version);
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite store at {:?}", path);
        Ok(Self { conn })
    }

    /// Every schema version, oldest first.
    pub fn list_schema_versions(&self) -> StoreResult<Vec<SchemaVersion>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT version, schema, created_at FROM schema_versions
                 ORDER BY version_number ASC",
            )
            .map_err(|e| unavailable("prepare version listing", e))?;

        let rows = stmt
            .query_map([], read_version_row)
            .map_err(|e| unavailable("list schema versions", e))?;

        let mut versions = Vec::new();
        for row in rows {
            let (version, schema, created_at) =
                row.map_err(|e| unavailable("read schema version row", e))?;
            versions.push(decode_version(&version, &schema, &created_at)?);
        }
        Ok(versions)
    }

    /// A single schema version by id.
    pub fn get_schema_version(&self, version: VersionId) -> StoreResult<Option<SchemaVersion>> {
        let row = self
            .conn
            .query_row(
                "SELECT version, schema, created_at FROM schema_versions
                 WHERE version_number = ?1",
                params![version_number(version)?],
                read_version_row,
            )
            .optional()
            .map_err(|e| unavailable("get schema version", e))?;

        row.map(|(version, schema, created_at)| decode_version(&version, &schema, &created_at))
            .transpose()
    }

    /// Number of processed records.
    pub fn count_processed_documents(&self) -> StoreResult<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM processed_documents", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u64)
            })
            .map_err(|e| unavailable("count processed documents", e))
    }

    /// Processed record counts grouped by schema version, oldest version
    /// first.
    pub fn processed_counts_by_version(&self) -> StoreResult<Vec<(VersionId, u64)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT schema_version, COUNT(*) FROM processed_documents
                 GROUP BY schema_version",
            )
            .map_err(|e| unavailable("prepare document counts", e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| unavailable("count documents by version", e))?;

        let mut counts = Vec::new();
        for row in rows {
            let (version, count) = row.map_err(|e| unavailable("read document count", e))?;
            let version: VersionId = version
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("{}", e)))?;
            counts.push((version, count as u64));
        }
        counts.sort_by_key(|(version, _)| *version);
        Ok(counts)
    }
}

impl SchemaStore for SqliteStore {
    fn latest_schema_version(&self) -> StoreResult<Option<SchemaVersion>> {
        let row = self
            .conn
            .query_row(
                "SELECT version, schema, created_at FROM schema_versions
                 ORDER BY created_at DESC, version_number DESC LIMIT 1",
                [],
                read_version_row,
            )
            .optional()
            .map_err(|e| unavailable("load latest schema version", e))?;

        row.map(|(version, schema, created_at)| decode_version(&version, &schema, &created_at))
            .transpose()
    }

    fn save_schema_version(&self, version: &SchemaVersion) -> StoreResult<()> {
        let schema = serde_json::to_string(&version.schema)
            .map_err(|e| StoreError::Unavailable(format!("Failed to serialize schema: {}", e)))?;

        let result = self.conn.execute(
            "INSERT INTO schema_versions (version_number, version, schema, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                version_number(version.version)?,
                version.version.to_string(),
                schema,
                timestamp(&version.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::VersionConflict {
                    version: version.version,
                })
            }
            Err(e) => Err(unavailable("save schema version", e)),
        }
    }

    fn save_processed_document(&self, doc: &ProcessedDocument) -> StoreResult<()> {
        let data = serde_json::to_string(&doc.data)
            .map_err(|e| StoreError::Unavailable(format!("Failed to serialize document: {}", e)))?;

        self.conn
            .execute(
                "INSERT INTO processed_documents (id, source_file, processed_at, schema_version, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    doc.id,
                    doc.source_file,
                    timestamp(&doc.processed_at),
                    doc.schema_version.to_string(),
                    data,
                ],
            )
            .map_err(|e| unavailable("save processed document", e))?;

        Ok(())
    }
}

fn unavailable(action: &str, err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(format!("Failed to {}: {}", action, err))
}

/// Fixed-width UTC timestamps, so text order matches time order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn version_number(version: VersionId) -> StoreResult<i64> {
    i64::try_from(version.number())
        .map_err(|_| StoreError::Unavailable(format!("{} exceeds the store's range", version)))
}

fn read_version_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode_version(version: &str, schema: &str, created_at: &str) -> StoreResult<SchemaVersion> {
    let version: VersionId = version
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("{}", e)))?;
    let schema: SchemaNode = serde_json::from_str(schema)
        .map_err(|e| StoreError::Corrupt(format!("schema of {}: {}", version, e)))?;
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| StoreError::Corrupt(format!("created_at of {}: {}", version, e)))?
        .with_timezone(&Utc);

    Ok(SchemaVersion {
        version,
        schema,
        created_at,
    })
}
