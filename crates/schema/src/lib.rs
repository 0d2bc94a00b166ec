//! Schema inference and evolution engine.
//!
//! Derives a schema tree from an arbitrary structured [`Value`], joins schema
//! trees with [`merge`], and keeps a versioned history of the joined shape
//! through [`SchemaEvolver`] on top of a [`SchemaStore`].
//!
//! The engine is single-writer: one evolver instance owns its cache slot and
//! must not be driven by overlapping `evolve` calls. Callers that share an
//! evolver across threads wrap it in a mutex.

pub mod error;
pub mod evolver;
pub mod infer;
pub mod merge;
pub mod node;
pub mod store;
pub mod value;
pub mod version;

pub use error::{StoreError, StoreResult};
pub use evolver::{Evolution, SchemaEvolver};
pub use infer::{infer, sanitize_key};
pub use merge::merge;
pub use node::{SchemaNode, TypeName};
pub use store::{MemoryStore, ProcessedDocument, SchemaStore};
pub use value::Value;
pub use version::{ParseVersionError, SchemaVersion, VersionId};
