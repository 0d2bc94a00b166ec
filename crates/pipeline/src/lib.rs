//! Ingestion pipeline around the schema engine.
//!
//! Raw files are read into structured values and fed to the schema evolver;
//! every processed document is recorded in SQLite.

pub mod extractor;
pub mod readers;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use extractor::Extractor;
pub use readers::FileKind;
pub use store::SqliteStore;
pub use types::{RunStats, StoreStats, VersionCount};

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use strata_core::{AppConfig, AppError, AppResult};
use strata_schema::{
    infer, Evolution, ProcessedDocument, SchemaEvolver, SchemaNode, SchemaStore, StoreError, Value,
};
use tracing::Instrument;

/// The evolver shared with blocking store tasks. The mutex is the single
/// writer boundary: at most one `evolve` runs at a time.
type SharedEvolver = Arc<Mutex<SchemaEvolver<SqliteStore>>>;

/// What happened to one input file.
#[derive(Debug)]
enum Outcome {
    Processed(Evolution),
    Skipped,
}

/// Run the pipeline once over the raw directory.
///
/// Per-document failures are logged and counted; the file stays in place so
/// the next run retries it. Only setup failures (invalid config, store not
/// openable) abort the run.
pub async fn run(config: &AppConfig) -> AppResult<RunStats> {
    let start = Instant::now();
    config.validate()?;

    let extractor = Extractor::new(
        config.raw_path(),
        config.processed_path(),
        config.error_path(),
    );
    let store = SqliteStore::open(&config.database_path())?;
    let evolver: SharedEvolver = Arc::new(Mutex::new(SchemaEvolver::new(store)));
    let timeout = Duration::from_secs(config.store_timeout_secs);

    tracing::info!("Starting pipeline run over {:?}", extractor.raw_dir());

    let files = extractor.discover_files();
    let mut stats = RunStats {
        discovered: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        tracing::info!("No new files found in {:?}", extractor.raw_dir());
    }

    for path in files {
        let span = tracing::debug_span!("document", file = %path.display());
        let outcome = process_file(
            &extractor,
            &evolver,
            &path,
            timeout,
            config.quarantine_unparseable,
        )
        .instrument(span)
        .await;

        match outcome {
            Ok(Outcome::Processed(evolution)) => {
                stats.processed += 1;
                if evolution.changed {
                    stats.versions_created += 1;
                }
            }
            Ok(Outcome::Skipped) => stats.skipped += 1,
            Err(e) => {
                tracing::error!("Failed to process {:?}: {}", path, e);
                stats.failed += 1;
            }
        }
    }

    stats.latest_version = lock(&evolver)?.cached().map(|v| v.version);
    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Pipeline run complete: {} processed, {} skipped, {} failed, {} new schema versions",
        stats.processed,
        stats.skipped,
        stats.failed,
        stats.versions_created
    );

    Ok(stats)
}

async fn process_file(
    extractor: &Extractor,
    evolver: &SharedEvolver,
    path: &Path,
    timeout: Duration,
    quarantine_unparseable: bool,
) -> AppResult<Outcome> {
    let (kind, content) = extractor.read_file(path)?;

    let Some(data) = readers::parse(kind, &content, path) else {
        tracing::warn!("Skipping {:?}, no structured data", path);
        if quarantine_unparseable {
            extractor.move_file(path, true)?;
        }
        return Ok(Outcome::Skipped);
    };

    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let evolution = evolve_and_record(evolver, source_file, data, timeout).await?;

    tracing::info!("{:?} conforms to schema version {}", path, evolution.version);
    extractor.move_file(path, false)?;
    Ok(Outcome::Processed(evolution))
}

/// Evolve the schema with `data` and persist the processed record, off the
/// async runtime and bounded by `timeout`.
async fn evolve_and_record(
    evolver: &SharedEvolver,
    source_file: String,
    data: Value,
    timeout: Duration,
) -> AppResult<Evolution> {
    let evolver = Arc::clone(evolver);
    let task = tokio::task::spawn_blocking(move || -> AppResult<Evolution> {
        let mut evolver = lock(&evolver)?;
        let evolution = evolver.evolve(&data).map_err(store_error)?;

        let record = ProcessedDocument::new(source_file, evolution.version, data);
        evolver
            .store()
            .save_processed_document(&record)
            .map_err(store_error)?;
        Ok(evolution)
    });

    let joined = tokio::time::timeout(timeout, task).await.map_err(|_| {
        AppError::Pipeline(format!("Store call timed out after {}s", timeout.as_secs()))
    })?;
    joined.map_err(|e| AppError::Pipeline(format!("Store task failed: {}", e)))?
}

fn lock<T>(mutex: &Mutex<T>) -> AppResult<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::Pipeline("Schema evolver lock poisoned".to_string()))
}

fn store_error(err: StoreError) -> AppError {
    AppError::Store(err.to_string())
}

/// Read a single file and infer its schema, without touching the store.
///
/// Returns `None` when no reader handles the file.
pub fn infer_file(path: &Path) -> AppResult<Option<SchemaNode>> {
    if !path.is_file() {
        return Err(AppError::Parse(format!("Not a file: {:?}", path)));
    }

    let kind = FileKind::from_path(path);
    let content = std::fs::read(path)?;
    Ok(readers::parse(kind, &content, path).map(|value| infer(&value)))
}

/// Open the configured store for read-only inspection.
///
/// Fails instead of creating an empty database when none exists yet.
pub fn open_store(config: &AppConfig) -> AppResult<SqliteStore> {
    let path = config.database_path();
    if !path.exists() {
        return Err(AppError::Store(format!(
            "No store at {:?}; run `strata run` first",
            path
        )));
    }
    SqliteStore::open(&path)
}

/// Processed-record counts per schema version.
pub fn store_stats(store: &SqliteStore) -> AppResult<StoreStats> {
    let versions = store.list_schema_versions().map_err(store_error)?;
    let processed_documents = store.count_processed_documents().map_err(store_error)?;
    let documents_by_version = store
        .processed_counts_by_version()
        .map_err(store_error)?
        .into_iter()
        .map(|(version, documents)| VersionCount { version, documents })
        .collect();

    Ok(StoreStats {
        schema_versions: versions.len(),
        processed_documents,
        documents_by_version,
    })
}
