//! Lattice join of two schema trees.

use std::collections::{BTreeMap, BTreeSet};

use crate::node::{SchemaNode, TypeName};

/// Join two schema trees into the narrowest tree describing both.
///
/// Pure and total; neither input is modified. Structurally equal inputs
/// return `old` unchanged. When the type signatures differ the result is
/// the promoted union of both signatures:
///
/// - `null` never forces a union and is dropped,
/// - `integer` alongside `number` widens to `number`,
/// - whatever remains is a single type or a sorted union scalar.
///
/// Incompatible shapes (an object meeting a string, say) collapse into a
/// union of kind names; no structural merge is attempted across kinds.
/// Equal signatures merge objects key by key and arrays item by item.
///
/// `merge` is idempotent, commutative and associative.
pub fn merge(old: &SchemaNode, new: &SchemaNode) -> SchemaNode {
    if old == new {
        return old.clone();
    }

    let old_sig = old.signature();
    let new_sig = new.signature();
    if old_sig != new_sig {
        return promote(old, new, &old_sig, &new_sig);
    }

    match (old, new) {
        (SchemaNode::Object(old_props), SchemaNode::Object(new_props)) => {
            SchemaNode::Object(merge_properties(old_props, new_props))
        }
        (SchemaNode::Array(old_items), SchemaNode::Array(new_items)) => {
            SchemaNode::array(merge(old_items, new_items))
        }
        // Same scalar type set; nothing but incidental metadata can differ.
        _ => old.clone(),
    }
}

fn promote(
    old: &SchemaNode,
    new: &SchemaNode,
    old_sig: &BTreeSet<TypeName>,
    new_sig: &BTreeSet<TypeName>,
) -> SchemaNode {
    let mut types: BTreeSet<TypeName> = old_sig.union(new_sig).copied().collect();
    types.remove(&TypeName::Null);

    if types.contains(&TypeName::Integer) && types.contains(&TypeName::Number) {
        types.remove(&TypeName::Integer);
    }

    // When one side already has the promoted signature it is the answer as
    // is. This keeps an object's properties (or an array's items) when the
    // other side was only ever null.
    if &types == old_sig {
        old.clone()
    } else if &types == new_sig {
        new.clone()
    } else {
        SchemaNode::from_types(types)
    }
}

fn merge_properties(
    old: &BTreeMap<String, SchemaNode>,
    new: &BTreeMap<String, SchemaNode>,
) -> BTreeMap<String, SchemaNode> {
    let mut merged = old.clone();
    for (key, new_node) in new {
        let node = match old.get(key) {
            Some(old_node) => merge(old_node, new_node),
            None => new_node.clone(),
        };
        merged.insert(key.clone(), node);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(t: TypeName) -> SchemaNode {
        SchemaNode::scalar(t)
    }

    fn union(types: &[TypeName]) -> SchemaNode {
        SchemaNode::from_types(types.iter().copied().collect())
    }

    /// Representative trees covering every merge path.
    fn corpus() -> Vec<SchemaNode> {
        vec![
            s(TypeName::Null),
            s(TypeName::Boolean),
            s(TypeName::Integer),
            s(TypeName::Number),
            s(TypeName::String),
            SchemaNode::unhandled("bytes"),
            union(&[TypeName::Integer, TypeName::String]),
            union(&[TypeName::Boolean, TypeName::Number]),
            union(&[TypeName::Object, TypeName::String]),
            SchemaNode::object(Vec::<(String, SchemaNode)>::new()),
            SchemaNode::object([("a", s(TypeName::Integer))]),
            SchemaNode::object([("a", s(TypeName::Number)), ("b", s(TypeName::Null))]),
            SchemaNode::object([
                ("a", s(TypeName::String)),
                ("c", SchemaNode::array(s(TypeName::Integer))),
            ]),
            SchemaNode::object([(
                "nested",
                SchemaNode::object([("x", SchemaNode::array(s(TypeName::Null)))]),
            )]),
            SchemaNode::array(s(TypeName::Null)),
            SchemaNode::array(s(TypeName::Integer)),
            SchemaNode::array(s(TypeName::Number)),
            SchemaNode::array(SchemaNode::object([("k", s(TypeName::Boolean))])),
            SchemaNode::array(union(&[TypeName::Array, TypeName::Integer])),
        ]
    }

    #[test]
    fn test_idempotence() {
        for a in corpus() {
            assert_eq!(merge(&a, &a), a, "merge(a, a) != a for {:?}", a);
        }
    }

    #[test]
    fn test_commutativity() {
        let corpus = corpus();
        for a in &corpus {
            for b in &corpus {
                assert_eq!(merge(a, b), merge(b, a), "a = {:?}, b = {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_associativity() {
        let corpus = corpus();
        for a in &corpus {
            for b in &corpus {
                for c in &corpus {
                    assert_eq!(
                        merge(&merge(a, b), c),
                        merge(a, &merge(b, c)),
                        "a = {:?}, b = {:?}, c = {:?}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_numeric_promotion() {
        let old = SchemaNode::object([("a", s(TypeName::Integer))]);
        let new = SchemaNode::object([("a", s(TypeName::Number))]);
        assert_eq!(
            merge(&old, &new),
            SchemaNode::object([("a", s(TypeName::Number))])
        );
    }

    #[test]
    fn test_union_scalar_is_sorted_and_symmetric() {
        let forward = merge(&s(TypeName::Integer), &s(TypeName::String));
        let backward = merge(&s(TypeName::String), &s(TypeName::Integer));
        assert_eq!(forward, backward);
        assert_eq!(
            serde_json::to_value(&forward).unwrap(),
            serde_json::json!({"type": ["integer", "string"]})
        );
    }

    #[test]
    fn test_null_never_forces_union() {
        assert_eq!(merge(&s(TypeName::Null), &s(TypeName::String)), s(TypeName::String));
        assert_eq!(merge(&s(TypeName::Boolean), &s(TypeName::Null)), s(TypeName::Boolean));

        let object = SchemaNode::object([("a", s(TypeName::Integer))]);
        assert_eq!(merge(&s(TypeName::Null), &object), object);
        assert_eq!(merge(&object, &s(TypeName::Null)), object);
    }

    #[test]
    fn test_integer_joins_existing_number_union() {
        let old = union(&[TypeName::Number, TypeName::String]);
        assert_eq!(merge(&old, &s(TypeName::Integer)), old);
    }

    #[test]
    fn test_incompatible_shapes_collapse_to_kind_union() {
        let object = SchemaNode::object([("a", s(TypeName::Integer))]);
        assert_eq!(
            merge(&object, &s(TypeName::String)),
            union(&[TypeName::Object, TypeName::String])
        );

        let array = SchemaNode::array(s(TypeName::Integer));
        assert_eq!(
            merge(&array, &object),
            union(&[TypeName::Array, TypeName::Object])
        );
    }

    #[test]
    fn test_object_key_union() {
        let old = SchemaNode::object([("a", s(TypeName::Integer)), ("b", s(TypeName::String))]);
        let new = SchemaNode::object([("b", s(TypeName::Boolean)), ("c", s(TypeName::Null))]);
        assert_eq!(
            merge(&old, &new),
            SchemaNode::object([
                ("a", s(TypeName::Integer)),
                ("b", union(&[TypeName::Boolean, TypeName::String])),
                ("c", s(TypeName::Null)),
            ])
        );
    }

    #[test]
    fn test_empty_array_widens() {
        let empty = SchemaNode::object([("x", SchemaNode::array(s(TypeName::Null)))]);
        let filled = SchemaNode::object([("x", SchemaNode::array(s(TypeName::Integer)))]);
        assert_eq!(merge(&empty, &filled), filled);
        assert_eq!(merge(&filled, &empty), filled);
    }

    #[test]
    fn test_equal_scalars_keep_old_note() {
        let old = SchemaNode::unhandled("bytes");
        let merged = merge(&old, &s(TypeName::String));
        assert_eq!(merged.note(), Some("unhandled value kind: bytes"));
    }

    #[test]
    fn test_inputs_are_not_modified() {
        let old = SchemaNode::object([("a", s(TypeName::Integer))]);
        let new = SchemaNode::object([("b", s(TypeName::String))]);
        let old_before = old.clone();
        let new_before = new.clone();
        let _ = merge(&old, &new);
        assert_eq!(old, old_before);
        assert_eq!(new, new_before);
    }
}
