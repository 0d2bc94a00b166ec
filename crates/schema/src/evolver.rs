//! Stateful schema evolution on top of a [`SchemaStore`].

use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::infer::infer;
use crate::merge::merge;
use crate::node::SchemaNode;
use crate::store::SchemaStore;
use crate::value::Value;
use crate::version::{SchemaVersion, VersionId};

/// Outcome of evolving the schema with one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evolution {
    /// The version the value conforms to.
    pub version: VersionId,
    /// The schema of that version.
    pub schema: SchemaNode,
    /// Whether this call minted `version`.
    pub changed: bool,
}

/// Keeps the schema version history current as values arrive.
///
/// Owns a single-slot cache of the latest known version. The cache is
/// filled lazily from the store (or with a freshly persisted `v0` baseline)
/// and replaced only after a new version was persisted. The store stays
/// authoritative; a failed store call never advances the cache.
///
/// Not safe for overlapping `evolve` calls: wrap the evolver in a mutex or
/// drive it from a single task.
#[derive(Debug)]
pub struct SchemaEvolver<S> {
    store: S,
    cache: Option<SchemaVersion>,
}

impl<S: SchemaStore> SchemaEvolver<S> {
    pub fn new(store: S) -> Self {
        SchemaEvolver { store, cache: None }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The cached latest version, without touching the store.
    pub fn cached(&self) -> Option<&SchemaVersion> {
        self.cache.as_ref()
    }

    /// Drop the cached version so the next call re-reads the store.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// The latest schema version, creating the `v0` baseline when the store
    /// holds none.
    pub fn latest(&mut self) -> StoreResult<&SchemaVersion> {
        let latest = match self.cache.take() {
            Some(cached) => cached,
            None => self.load_or_seed()?,
        };
        Ok(self.cache.insert(latest))
    }

    fn load_or_seed(&self) -> StoreResult<SchemaVersion> {
        if let Some(latest) = self.store.latest_schema_version()? {
            tracing::debug!("Loaded latest schema version {}", latest.version);
            return Ok(latest);
        }

        tracing::info!("No schema version found in the store, creating v0");
        let baseline = SchemaVersion::baseline(Utc::now());
        self.store.save_schema_version(&baseline)?;
        Ok(baseline)
    }

    /// Infer the schema of `value`, merge it into the latest version, and
    /// persist a new version if the merged tree differs.
    pub fn evolve(&mut self, value: &Value) -> StoreResult<Evolution> {
        let candidate = infer(value);

        let (current, merged) = {
            let latest = self.latest()?;
            let merged = merge(&latest.schema, &candidate);
            if merged == latest.schema {
                return Ok(Evolution {
                    version: latest.version,
                    schema: latest.schema.clone(),
                    changed: false,
                });
            }
            (latest.version, merged)
        };

        let version = current
            .next()
            .ok_or_else(|| StoreError::Corrupt(format!("no version can follow {}", current)))?;
        let next = SchemaVersion {
            version,
            schema: merged,
            created_at: Utc::now(),
        };

        if let Err(err) = self.store.save_schema_version(&next) {
            if matches!(err, StoreError::VersionConflict { .. }) {
                tracing::warn!(
                    "Schema version {} already exists, refreshing from the store",
                    next.version
                );
                self.invalidate();
            }
            return Err(err);
        }

        tracing::info!(
            "Schema evolution detected: {} -> {} ({} nodes)",
            current,
            next.version,
            next.schema.node_count()
        );

        let evolution = Evolution {
            version: next.version,
            schema: next.schema.clone(),
            changed: true,
        };
        self.cache = Some(next);
        Ok(evolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TypeName;
    use crate::store::{MemoryStore, ProcessedDocument};
    use serde_json::json;
    use std::cell::Cell;

    fn value(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    /// Store wrapper that fails on demand and counts calls.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: Cell<bool>,
        fail_writes: Cell<bool>,
        reads: Cell<usize>,
    }

    impl SchemaStore for FlakyStore {
        fn latest_schema_version(&self) -> StoreResult<Option<SchemaVersion>> {
            self.reads.set(self.reads.get() + 1);
            if self.fail_reads.get() {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.latest_schema_version()
        }

        fn save_schema_version(&self, version: &SchemaVersion) -> StoreResult<()> {
            if self.fail_writes.get() {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.save_schema_version(version)
        }

        fn save_processed_document(&self, doc: &ProcessedDocument) -> StoreResult<()> {
            self.inner.save_processed_document(doc)
        }
    }

    #[test]
    fn test_latest_seeds_baseline_once() {
        let store = MemoryStore::new();
        let mut evolver = SchemaEvolver::new(&store);

        let latest = evolver.latest().unwrap().clone();
        assert_eq!(latest.version, VersionId::BASELINE);
        assert_eq!(latest.schema, SchemaNode::Object(Default::default()));

        evolver.latest().unwrap();
        assert_eq!(store.versions().len(), 1);
    }

    #[test]
    fn test_latest_uses_existing_version() {
        let store = MemoryStore::new();
        let existing = SchemaVersion {
            version: VersionId::new(7),
            schema: SchemaNode::object([("a", SchemaNode::scalar(TypeName::String))]),
            created_at: Utc::now(),
        };
        store.save_schema_version(&existing).unwrap();

        let mut evolver = SchemaEvolver::new(&store);
        assert_eq!(evolver.latest().unwrap(), &existing);
        assert_eq!(store.versions().len(), 1);
    }

    #[test]
    fn test_latest_is_cached() {
        let store = FlakyStore::default();
        let mut evolver = SchemaEvolver::new(&store);
        evolver.latest().unwrap();
        evolver.latest().unwrap();
        evolver.evolve(&value(json!({}))).unwrap();
        assert_eq!(store.reads.get(), 1);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let store = MemoryStore::new();
        let mut evolver = SchemaEvolver::new(&store);

        let first = evolver.evolve(&value(json!({"a": 1}))).unwrap();
        assert_eq!(first.version.to_string(), "v1");
        assert!(first.changed);
        assert_eq!(
            first.schema,
            SchemaNode::object([("a", SchemaNode::scalar(TypeName::Integer))])
        );

        let second = evolver.evolve(&value(json!({"a": 2.5}))).unwrap();
        assert_eq!(second.version.to_string(), "v2");
        assert_eq!(
            second.schema,
            SchemaNode::object([("a", SchemaNode::scalar(TypeName::Number))])
        );

        let third = evolver.evolve(&value(json!({"a": 3}))).unwrap();
        assert_eq!(third.version.to_string(), "v2");
        assert!(!third.changed);
        assert_eq!(third.schema, second.schema);

        let versions: Vec<String> = store
            .versions()
            .iter()
            .map(|v| v.version.to_string())
            .collect();
        assert_eq!(versions, ["v0", "v1", "v2"]);
    }

    #[test]
    fn test_identical_shape_issues_no_second_write() {
        let store = MemoryStore::new();
        let mut evolver = SchemaEvolver::new(&store);

        let first = evolver.evolve(&value(json!({"name": "a", "n": 1}))).unwrap();
        let writes = store.versions().len();
        let second = evolver.evolve(&value(json!({"name": "b", "n": 2}))).unwrap();

        assert_eq!(first.version, second.version);
        assert!(!second.changed);
        assert_eq!(store.versions().len(), writes);
    }

    #[test]
    fn test_versions_are_monotonic_without_gaps() {
        let store = MemoryStore::new();
        let mut evolver = SchemaEvolver::new(&store);

        let docs = [
            json!({"a": 1}),
            json!({"b": true}),
            json!({"c": "x"}),
            json!({"a": "now a string"}),
            json!({"d": [1]}),
        ];
        for (i, doc) in docs.iter().enumerate() {
            let evolution = evolver.evolve(&value(doc.clone())).unwrap();
            assert!(evolution.changed);
            assert_eq!(evolution.version, VersionId::new(i as u64 + 1));
        }

        let numbers: Vec<u64> = store.versions().iter().map(|v| v.version.number()).collect();
        assert_eq!(numbers, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_array_widens_into_new_version() {
        let store = MemoryStore::new();
        let mut evolver = SchemaEvolver::new(&store);

        let empty = evolver.evolve(&value(json!({"x": []}))).unwrap();
        assert_eq!(
            empty.schema,
            SchemaNode::object([("x", SchemaNode::array(SchemaNode::null()))])
        );

        let filled = evolver.evolve(&value(json!({"x": [1]}))).unwrap();
        assert!(filled.changed);
        assert_eq!(
            filled.schema,
            SchemaNode::object([(
                "x",
                SchemaNode::array(SchemaNode::scalar(TypeName::Integer))
            )])
        );
    }

    #[test]
    fn test_read_failure_propagates_and_leaves_cache_empty() {
        let store = FlakyStore::default();
        store.fail_reads.set(true);
        let mut evolver = SchemaEvolver::new(&store);

        let err = evolver.evolve(&value(json!({"a": 1}))).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(evolver.cached().is_none());

        store.fail_reads.set(false);
        let evolution = evolver.evolve(&value(json!({"a": 1}))).unwrap();
        assert_eq!(evolution.version, VersionId::new(1));
    }

    #[test]
    fn test_write_failure_does_not_advance_cache() {
        let store = FlakyStore::default();
        let mut evolver = SchemaEvolver::new(&store);
        evolver.evolve(&value(json!({"a": 1}))).unwrap();

        store.fail_writes.set(true);
        assert!(evolver.evolve(&value(json!({"b": 1}))).is_err());
        assert_eq!(evolver.cached().map(|v| v.version), Some(VersionId::new(1)));
        assert_eq!(store.inner.versions().len(), 2);

        // The next document after the failure evolves from v1 as if the
        // failed one never arrived.
        store.fail_writes.set(false);
        let evolution = evolver.evolve(&value(json!({"c": 1}))).unwrap();
        assert_eq!(evolution.version, VersionId::new(2));
        assert_eq!(
            evolution.schema,
            SchemaNode::object([
                ("a", SchemaNode::scalar(TypeName::Integer)),
                ("c", SchemaNode::scalar(TypeName::Integer)),
            ])
        );
    }

    #[test]
    fn test_version_conflict_refreshes_from_store() {
        let store = MemoryStore::new();
        let mut stale = SchemaEvolver::new(&store);
        let mut other = SchemaEvolver::new(&store);

        stale.evolve(&value(json!({"a": 1}))).unwrap();
        other.evolve(&value(json!({"b": 1}))).unwrap();

        // `stale` still believes v1 is latest and tries to mint v2 again.
        let err = stale.evolve(&value(json!({"c": 1}))).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict { version } if version == VersionId::new(2)
        ));
        assert!(stale.cached().is_none());

        let retried = stale.evolve(&value(json!({"c": 1}))).unwrap();
        assert_eq!(retried.version, VersionId::new(3));
        assert_eq!(
            retried.schema,
            SchemaNode::object([
                ("a", SchemaNode::scalar(TypeName::Integer)),
                ("b", SchemaNode::scalar(TypeName::Integer)),
                ("c", SchemaNode::scalar(TypeName::Integer)),
            ])
        );
    }

    #[test]
    fn test_exhausted_version_counter_is_an_error() {
        let store = MemoryStore::new();
        let last = SchemaVersion {
            version: VersionId::new(u64::MAX),
            schema: SchemaNode::object([("a", SchemaNode::scalar(TypeName::String))]),
            created_at: Utc::now(),
        };
        store.save_schema_version(&last).unwrap();

        let mut evolver = SchemaEvolver::new(&store);
        let err = evolver.evolve(&value(json!({"b": 1}))).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert_eq!(evolver.cached(), Some(&last));
        assert_eq!(store.versions().len(), 1);

        // A conforming document still resolves to the last version.
        let same = evolver.evolve(&value(json!({"a": "x"}))).unwrap();
        assert_eq!(same.version, VersionId::new(u64::MAX));
        assert!(!same.changed);
    }
}
