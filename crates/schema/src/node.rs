//! The schema tree model.
//!
//! A [`SchemaNode`] is one of three shapes: a scalar carrying a non-empty set
//! of type names, an object mapping field names to nodes, or an array whose
//! single item node describes every element observed at that position.
//!
//! Trees persist in the familiar JSON-Schema-like layout:
//!
//! ```json
//! {"type": "object", "properties": {
//!     "id": {"type": "integer"},
//!     "tags": {"type": "array", "items": {"type": "string"}},
//!     "score": {"type": ["number", "string"]}
//! }}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A type name appearing in a node's type signature.
///
/// Variants are declared alphabetically so the derived `Ord` sorts union
/// scalars lexicographically by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Array => "array",
            TypeName::Boolean => "boolean",
            TypeName::Integer => "integer",
            TypeName::Null => "null",
            TypeName::Number => "number",
            TypeName::Object => "object",
            TypeName::String => "string",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of a schema tree.
///
/// Equality compares shape and type-name sets only; the diagnostic `note` on
/// scalars is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub enum SchemaNode {
    Scalar {
        /// Never empty. More than one member makes this a union scalar.
        types: BTreeSet<TypeName>,
        note: Option<String>,
    },
    Object(BTreeMap<String, SchemaNode>),
    Array(Box<SchemaNode>),
}

impl SchemaNode {
    /// A scalar of a single type.
    pub fn scalar(type_name: TypeName) -> Self {
        Self::from_types(BTreeSet::from([type_name]))
    }

    /// The `null` scalar, also the item type of never-populated arrays.
    pub fn null() -> Self {
        Self::scalar(TypeName::Null)
    }

    /// A string scalar standing in for a value kind inference has no entry for.
    pub fn unhandled(kind: &str) -> Self {
        SchemaNode::Scalar {
            types: BTreeSet::from([TypeName::String]),
            note: Some(format!("unhandled value kind: {}", kind)),
        }
    }

    /// A node whose signature is exactly `types`.
    ///
    /// A lone `object` or `array` becomes an empty object or a null-item array
    /// so that kind names only ever appear as scalars inside real unions.
    /// An empty set yields the `null` scalar.
    pub fn from_types(types: BTreeSet<TypeName>) -> Self {
        if types.len() == 1 {
            if types.contains(&TypeName::Object) {
                return SchemaNode::Object(BTreeMap::new());
            }
            if types.contains(&TypeName::Array) {
                return SchemaNode::Array(Box::new(SchemaNode::null()));
            }
        }
        let types = if types.is_empty() {
            BTreeSet::from([TypeName::Null])
        } else {
            types
        };
        SchemaNode::Scalar { types, note: None }
    }

    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        SchemaNode::Object(properties.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array(Box::new(items))
    }

    /// The node's type signature: its own set for scalars, `{object}` or
    /// `{array}` for structured nodes.
    pub fn signature(&self) -> BTreeSet<TypeName> {
        match self {
            SchemaNode::Scalar { types, .. } => types.clone(),
            SchemaNode::Object(_) => BTreeSet::from([TypeName::Object]),
            SchemaNode::Array(_) => BTreeSet::from([TypeName::Array]),
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            SchemaNode::Scalar { note, .. } => note.as_deref(),
            _ => None,
        }
    }

    /// Number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        match self {
            SchemaNode::Scalar { .. } => 1,
            SchemaNode::Object(properties) => {
                1 + properties.values().map(SchemaNode::node_count).sum::<usize>()
            }
            SchemaNode::Array(items) => 1 + items.node_count(),
        }
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SchemaNode::Scalar { types: a, .. }, SchemaNode::Scalar { types: b, .. }) => a == b,
            (SchemaNode::Object(a), SchemaNode::Object(b)) => a == b,
            (SchemaNode::Array(a), SchemaNode::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SchemaNode {}

/// Wire layout of a schema node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSchema {
    #[serde(rename = "type")]
    schema_type: RawType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<BTreeMap<String, SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawType {
    One(TypeName),
    Many(Vec<TypeName>),
}

impl From<SchemaNode> for RawSchema {
    fn from(node: SchemaNode) -> Self {
        match node {
            SchemaNode::Scalar { types, note } => {
                let schema_type = if types.len() == 1 {
                    match types.iter().next() {
                        Some(t) => RawType::One(*t),
                        None => RawType::One(TypeName::Null),
                    }
                } else {
                    RawType::Many(types.into_iter().collect())
                };
                RawSchema {
                    schema_type,
                    properties: None,
                    items: None,
                    description: note,
                }
            }
            SchemaNode::Object(properties) => RawSchema {
                schema_type: RawType::One(TypeName::Object),
                properties: Some(properties),
                items: None,
                description: None,
            },
            SchemaNode::Array(items) => RawSchema {
                schema_type: RawType::One(TypeName::Array),
                properties: None,
                items: Some(items),
                description: None,
            },
        }
    }
}

impl TryFrom<RawSchema> for SchemaNode {
    type Error = String;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let types: BTreeSet<TypeName> = match raw.schema_type {
            RawType::One(t) => BTreeSet::from([t]),
            RawType::Many(list) => list.into_iter().collect(),
        };

        if types.is_empty() {
            return Err("schema node has an empty type list".to_string());
        }

        if types.len() == 1 {
            if types.contains(&TypeName::Object) {
                return Ok(SchemaNode::Object(raw.properties.unwrap_or_default()));
            }
            if types.contains(&TypeName::Array) {
                let items = raw.items.unwrap_or_else(|| Box::new(SchemaNode::null()));
                return Ok(SchemaNode::Array(items));
            }
        }

        Ok(SchemaNode::Scalar {
            types,
            note: raw.description,
        })
    }
}
