//! Inference of a schema tree from one structured value.

use crate::merge::merge;
use crate::node::{SchemaNode, TypeName};
use crate::value::Value;

/// Infer the schema tree of `value`.
///
/// Total over every [`Value`]: kinds without an entry in the scalar type
/// table degrade to a string scalar carrying an "unhandled" note. Map keys
/// are sanitized before they are stored; keys that collide after
/// sanitization overwrite each other. Array items are inferred one by one
/// and folded through [`merge`].
pub fn infer(value: &Value) -> SchemaNode {
    match value {
        Value::Map(entries) => SchemaNode::Object(
            entries
                .iter()
                .map(|(key, value)| (sanitize_key(key), infer(value)))
                .collect(),
        ),
        Value::List(items) => {
            let items = items
                .iter()
                .map(infer)
                .reduce(|acc, item| merge(&acc, &item))
                .unwrap_or_else(SchemaNode::null);
            SchemaNode::array(items)
        }
        scalar => match scalar_type(scalar) {
            Some(type_name) => SchemaNode::scalar(type_name),
            None => SchemaNode::unhandled(scalar.kind()),
        },
    }
}

/// The closed table mapping scalar value kinds to schema type names.
fn scalar_type(value: &Value) -> Option<TypeName> {
    match value {
        Value::Null => Some(TypeName::Null),
        Value::Bool(_) => Some(TypeName::Boolean),
        Value::Integer(_) | Value::Unsigned(_) => Some(TypeName::Integer),
        Value::Float(_) => Some(TypeName::Number),
        Value::Text(_) | Value::Timestamp(_) => Some(TypeName::String),
        Value::Bytes(_) | Value::Map(_) | Value::List(_) => None,
    }
}

/// Rewrite a field name into one the document store accepts as a key:
/// every `.` becomes `_`, and so does a leading `$`.
pub fn sanitize_key(key: &str) -> String {
    let dotless = key.replace('.', "_");
    match dotless.strip_prefix('$') {
        Some(rest) => format!("_{}", rest),
        None => dotless,
    }
}
