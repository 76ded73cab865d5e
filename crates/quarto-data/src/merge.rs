/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Deep merge of values.
 *
 * Merging is additive: mappings are merged key by key, sequences of the same
 * shape are concatenated, and everything else is replaced by the incoming
 * value. `Null` never overwrites anything. Removing data therefore needs an
 * explicit delete, which is why patches delete before they merge.
 */

use crate::value::{Mapping, Shape, Value};

/// Merge `values` left to right into a brand-new value.
///
/// The result owns all of its storage; nothing is shared with the inputs.
/// Merging nothing yields the empty mapping.
pub fn merge<'a, I>(values: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut target = Value::empty_mapping();

    for value in values {
        merge_into(&mut target, value);
    }

    target
}

/// Merge `source` into `target` in place.
///
/// `target` must be exclusively owned by the caller; `source` is only read
/// and every piece taken from it is deep-cloned.
pub fn merge_into(target: &mut Value, source: &Value) {
    match (target, source) {
        // Null means "no value supplied"
        (_, Value::Null) => {}
        (Value::Mapping(into), Value::Mapping(from)) => merge_mapping(into, from),
        (Value::Sequence(into), Value::Sequence(from)) => {
            let existing = Shape::of(into.as_slice());
            let incoming = Shape::of(from.as_slice());

            if existing.is_compatible(&incoming) {
                into.extend(from.iter().cloned());
            } else {
                tracing::trace!(?existing, ?incoming, "Sequence shapes differ, replacing");
                *into = from.clone();
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Key-wise merge of one mapping into another.
pub(crate) fn merge_mapping(into: &mut Mapping, from: &Mapping) {
    for (key, incoming) in from {
        if incoming.is_null() {
            continue;
        }

        match into.get_mut(key) {
            Some(existing) => merge_into(existing, incoming),
            None => {
                into.insert(key.clone(), incoming.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        entries.into_iter().collect()
    }

    #[test]
    fn test_merge_nothing_is_empty() {
        assert_eq!(merge(&[] as &[Value]), Value::empty_mapping());
    }

    #[test]
    fn test_merge_single_is_deep_copy() {
        let a = map(vec![("a", map(vec![("b", Value::Int(1))]))]);
        assert_eq!(merge([&a]), a);
    }

    #[test]
    fn test_type_mismatch_replaces() {
        let a = map(vec![("a", Value::Int(1))]);
        let b = map(vec![("a", map(vec![("x", Value::Int(1))]))]);
        assert_eq!(merge([&a, &b]), b);
    }

    #[test]
    fn test_sequences_of_same_shape_concatenate() {
        let a = map(vec![("s", Value::from(vec![1, 2]))]);
        let b = map(vec![("s", Value::from(vec![3, 4]))]);
        assert_eq!(
            merge([&a, &b]),
            map(vec![("s", Value::from(vec![1, 2, 3, 4]))])
        );
    }

    #[test]
    fn test_sequences_of_different_shape_replace() {
        let a = map(vec![("d", Value::from(vec![1i8, 2, 3]))]);
        let b = map(vec![("d", Value::from(vec![4u32, 5]))]);
        assert_eq!(merge([&a, &b]), b);
    }

    #[test]
    fn test_mixed_sequences_concatenate() {
        let a = map(vec![("m", Value::Sequence(vec![Value::Int(1), "x".into()]))]);
        let b = map(vec![("m", Value::Sequence(vec![Value::Bool(true), 2.5.into()]))]);
        let merged = merge([&a, &b]);
        assert_eq!(merged.query("m").and_then(Value::as_sequence).map(<[Value]>::len), Some(4));
    }

    #[test]
    fn test_empty_sequence_replaces() {
        let a = map(vec![("s", Value::from(vec![1, 2]))]);
        let b = map(vec![("s", Value::Sequence(vec![]))]);
        assert_eq!(merge([&a, &b]), b);
        assert_eq!(merge([&b, &a]), a);
        assert_eq!(merge([&b, &b]), b);
    }

    #[test]
    fn test_null_never_overwrites() {
        let a = map(vec![("a", Value::Int(1))]);
        let b = map(vec![("a", Value::Null), ("n", Value::Null)]);
        assert_eq!(merge([&a, &b]), a);

        let mut target = a.clone();
        merge_into(&mut target, &Value::Null);
        assert_eq!(target, a);
    }

    #[test]
    fn test_nested_mappings_union() {
        let a = map(vec![(
            "map",
            map(vec![("a", Value::Bool(true)), ("b", "string".into())]),
        )]);
        let b = map(vec![(
            "map",
            map(vec![("a", Value::Bool(false)), ("c", Value::Int(123))]),
        )]);
        let expected = map(vec![(
            "map",
            map(vec![
                ("a", Value::Bool(false)),
                ("b", "string".into()),
                ("c", Value::Int(123)),
            ]),
        )]);
        assert_eq!(merge([&a, &b]), expected);
    }

    #[test]
    fn test_pairwise_associativity() {
        let a = map(vec![("s", Value::from(vec![1])), ("k", Value::Int(1))]);
        let b = map(vec![("s", Value::from(vec![2])), ("m", map(vec![("x", Value::Int(1))]))]);
        let c = map(vec![("s", Value::from(vec![3])), ("m", map(vec![("y", Value::Int(2))]))]);

        let ab = merge([&a, &b]);
        assert_eq!(merge([&a, &b, &c]), merge([&ab, &c]));
    }

    #[test]
    fn test_result_does_not_alias_inputs() {
        let a = map(vec![("m", map(vec![("x", Value::Int(1))]))]);
        let b = map(vec![("s", Value::from(vec![1]))]);
        let mut merged = merge([&a, &b]);

        merged
            .as_mapping_mut()
            .unwrap()
            .insert("this-is-a-key-not-exist".into(), Value::Bool(true));
        if let Some(Value::Mapping(m)) = merged.get_mut(&"m".into()) {
            m.insert("y".into(), Value::Int(2));
        }

        assert_eq!(a, map(vec![("m", map(vec![("x", Value::Int(1))]))]));
        assert_eq!(b, map(vec![("s", Value::from(vec![1]))]));
    }
}
