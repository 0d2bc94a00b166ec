//! Schema version identifiers and version documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::node::SchemaNode;

/// A schema version id, rendered as `"v"` followed by a decimal integer
/// without leading zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionId(u64);

impl VersionId {
    /// The reserved empty-object baseline.
    pub const BASELINE: VersionId = VersionId(0);

    pub fn new(number: u64) -> Self {
        VersionId(number)
    }

    pub fn number(&self) -> u64 {
        self.0
    }

    /// The version minted after this one, or `None` once the counter is
    /// exhausted.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(VersionId)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema version id {input:?}: {reason}")]
pub struct ParseVersionError {
    input: String,
    reason: &'static str,
}

impl FromStr for VersionId {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| ParseVersionError {
            input: s.to_string(),
            reason,
        };

        let digits = s.strip_prefix('v').ok_or_else(|| fail("missing 'v' prefix"))?;
        if digits.is_empty() {
            return Err(fail("missing version number"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail("version number must be decimal digits"));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(fail("leading zeros are not allowed"));
        }

        digits
            .parse::<u64>()
            .map(VersionId)
            .map_err(|_| fail("version number out of range"))
    }
}

impl Serialize for VersionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An immutable, timestamped snapshot of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub version: VersionId,
    pub schema: SchemaNode,
    pub created_at: DateTime<Utc>,
}

impl SchemaVersion {
    /// The `v0` empty-object baseline.
    pub fn baseline(created_at: DateTime<Utc>) -> Self {
        SchemaVersion {
            version: VersionId::BASELINE,
            schema: SchemaNode::Object(Default::default()),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        assert_eq!(VersionId::new(0).to_string(), "v0");
        assert_eq!(VersionId::new(42).to_string(), "v42");
        assert_eq!("v0".parse::<VersionId>().unwrap(), VersionId::BASELINE);
        assert_eq!("v17".parse::<VersionId>().unwrap(), VersionId::new(17));
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for bad in ["", "v", "17", "V1", "v01", "v-1", "v1.0", "v 1", "v99999999999999999999"] {
            assert!(bad.parse::<VersionId>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_next_is_strictly_increasing() {
        let mut id = VersionId::BASELINE;
        for expected in 1..=5 {
            id = id.next().unwrap();
            assert_eq!(id.number(), expected);
        }
        assert!(VersionId::new(9) < VersionId::new(10));
        assert_eq!(VersionId::new(u64::MAX).next(), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_value(VersionId::new(3)).unwrap();
        assert_eq!(json, serde_json::json!("v3"));
        let back: VersionId = serde_json::from_value(json).unwrap();
        assert_eq!(back, VersionId::new(3));
        assert!(serde_json::from_value::<VersionId>(serde_json::json!("3")).is_err());
    }

    #[test]
    fn test_baseline_is_empty_object() {
        let baseline = SchemaVersion::baseline(Utc::now());
        assert_eq!(baseline.version.to_string(), "v0");
        assert_eq!(baseline.schema, SchemaNode::Object(Default::default()));
    }
}
