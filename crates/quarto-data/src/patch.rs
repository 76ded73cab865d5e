/*
 * patch.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Ordered delete-then-merge updates to data documents.
 */

use crate::data::Data;
use crate::error::{DataError, Result};
use crate::merge::merge_mapping;
use crate::path::Path;
use crate::value::{Mapping, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered list of [`PatchAction`]s.
///
/// Actions run one after the other; each finishes all of its deletes and
/// updates before the next one starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    actions: Vec<PatchAction>,
}

/// One patch step: delete some paths, then merge data into others.
///
/// Updates are merged, not assigned, so an existing sequence is appended to
/// and an existing mapping gains keys. To replace a value, delete it in the
/// same action first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchAction {
    /// Queries to delete. Missing paths are ignored; `""` clears everything.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletes: Vec<String>,

    /// Query of an existing mapping → data to merge into it.
    ///
    /// Applied in ascending key order, so a path is always handled before any
    /// of its descendants (`"a"` before `"a.b"`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updates: BTreeMap<String, Data>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action built from its deletes and updates.
    pub fn add<I, S>(&mut self, deletes: I, updates: BTreeMap<String, Data>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(PatchAction {
            deletes: deletes.into_iter().map(Into::into).collect(),
            updates,
        })
    }

    /// Append an action.
    pub fn push(&mut self, action: PatchAction) -> &mut Self {
        self.actions.push(action);
        self
    }

    /// Builder form of [`Patch::push`].
    pub fn with_action(mut self, action: PatchAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(&self) -> &[PatchAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Apply the patch to a private copy of `data` and return it.
    ///
    /// `data` itself is never touched, even when an action fails.
    ///
    /// # Errors
    ///
    /// - `InvalidQuery` if an update path does not resolve
    /// - `UnsupportedMergeTarget` if an update path resolves to a non-mapping
    pub fn apply(&self, data: &Data) -> Result<Data> {
        let mut copy = data.clone();
        self.apply_to(&mut copy)?;
        Ok(copy)
    }

    /// Apply the patch directly to `target`.
    ///
    /// Stops at the first failing action; `target` keeps whatever the earlier
    /// steps already did. Use [`Patch::apply`] when that matters.
    pub fn apply_to(&self, target: &mut Data) -> Result<()> {
        for action in &self.actions {
            action.apply_to(target)?;
        }

        Ok(())
    }
}

impl FromIterator<PatchAction> for Patch {
    fn from_iter<I: IntoIterator<Item = PatchAction>>(iter: I) -> Self {
        Patch {
            actions: iter.into_iter().collect(),
        }
    }
}

impl PatchAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query to delete.
    pub fn delete(mut self, query: impl Into<String>) -> Self {
        self.deletes.push(query.into());
        self
    }

    /// Merge `data` into the mapping at `query`, replacing any update
    /// already registered for the same query.
    pub fn update(mut self, query: impl Into<String>, data: Data) -> Self {
        self.updates.insert(query.into(), data);
        self
    }

    /// Apply this action to `target`: all deletes, then all updates.
    pub fn apply_to(&self, target: &mut Data) -> Result<()> {
        tracing::debug!(
            deletes = self.deletes.len(),
            updates = self.updates.len(),
            "Applying patch action"
        );

        target.delete_all(&self.deletes);

        for (query, update) in &self.updates {
            let entries = merge_target(target, query)?;
            merge_mapping(entries, update.entries());
        }

        Ok(())
    }
}

/// Find the mapping an update is merged into.
fn merge_target<'a>(target: &'a mut Data, query: &str) -> Result<&'a mut Mapping> {
    let path = Path::parse(query);

    if path.is_root() {
        return Ok(target.entries_mut());
    }

    match target.get_mut(&path) {
        Some(Value::Mapping(map)) => Ok(map),
        Some(_) => Err(DataError::UnsupportedMergeTarget {
            query: query.to_string(),
        }),
        None => Err(DataError::invalid_query(query)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(entries: Vec<(&str, Value)>) -> Data {
        entries.into_iter().collect()
    }

    fn map(entries: Vec<(&str, Value)>) -> Value {
        entries.into_iter().collect()
    }

    #[test]
    fn test_delete_then_merge_at_root() {
        let target = data(vec![("v1", Value::from(vec![1])), ("v2", Value::Int(123))]);
        let patch = Patch::new().with_action(
            PatchAction::new()
                .delete("v2")
                .update("", data(vec![("v1", Value::from(vec![2, 3]))])),
        );

        let applied = patch.apply(&target).unwrap();
        assert_eq!(applied, data(vec![("v1", Value::from(vec![1, 2, 3]))]));
    }

    #[test]
    fn test_actions_run_in_order() {
        let target = data(vec![
            ("v1", Value::from(vec![1])),
            ("v2", Value::Int(123)),
            ("v3", Value::from(vec!["first", "second", "third"])),
            (
                "v4",
                map(vec![
                    ("v4-1", "old".into()),
                    ("v4-2", map(vec![("old", Value::Bool(true))])),
                ]),
            ),
        ]);

        let mut patch = Patch::new();
        patch
            .add(["v2", "v3.1", "v4.v4-1"], BTreeMap::new())
            .push(
                PatchAction::new()
                    .update(
                        "",
                        data(vec![("v1", Value::from(vec![2, 3])), ("v2", Value::Int(456))]),
                    )
                    .update("v4", data(vec![("v4-1", "new".into())])),
            )
            .push(PatchAction::new().delete("v4.v4-2").update(
                "v4",
                data(vec![("v4-2", map(vec![("new", Value::Bool(true))]))]),
            ));

        let mut applied = target.clone();
        patch.apply_to(&mut applied).unwrap();

        let expected = data(vec![
            ("v1", Value::from(vec![1, 2, 3])),
            ("v2", Value::Int(456)),
            ("v3", Value::from(vec!["first", "third"])),
            (
                "v4",
                map(vec![
                    ("v4-1", "new".into()),
                    ("v4-2", map(vec![("new", Value::Bool(true))])),
                ]),
            ),
        ]);
        assert_eq!(applied, expected);
    }

    #[test]
    fn test_shallow_update_lands_before_deep_one() {
        // "a" creates "b"; "a.b" can only resolve once that happened.
        let target = data(vec![("a", map(vec![]))]);
        let action = PatchAction::new()
            .update("a.b", data(vec![("y", Value::Int(2))]))
            .update("a", data(vec![("b", map(vec![("x", Value::Int(1))]))]));

        let applied = Patch::new().with_action(action).apply(&target).unwrap();
        assert_eq!(
            applied.query("a.b"),
            Some(&map(vec![("x", Value::Int(1)), ("y", Value::Int(2))]))
        );
    }

    #[test]
    fn test_update_into_nested_sequences() {
        let leaf = map(vec![("v4-1", "old".into())]);
        let target = data(vec![(
            "v4",
            Value::Sequence(vec![
                Value::Null,
                Value::Null,
                Value::Sequence(vec![
                    Value::Null,
                    Value::Sequence(vec![Value::Null, Value::Null, leaf]),
                ]),
            ]),
        )]);
        let patch = Patch::new().with_action(PatchAction::new().update(
            "v4.2.1.2",
            data(vec![("v4-1", "new".into()), ("v4-2", Value::Int(2222))]),
        ));

        let applied = patch.apply(&target).unwrap();
        assert_eq!(
            applied.query("v4.2.1.2"),
            Some(&map(vec![("v4-1", "new".into()), ("v4-2", Value::Int(2222))]))
        );
    }

    #[test]
    fn test_delete_everything() {
        let target = data(vec![("a", Value::Int(1))]);
        let patch = Patch::new().with_action(PatchAction::new().delete(""));
        assert_eq!(patch.apply(&target).unwrap(), Data::default());
    }

    #[test]
    fn test_missing_deletes_are_ignored() {
        let target = data(vec![("arr", Value::from(vec![1, 2, 3]))]);
        let patch = Patch::new().with_action(PatchAction::new().delete("arr.3").delete("foo"));
        assert_eq!(patch.apply(&target).unwrap(), target);
    }

    #[test]
    fn test_missing_update_target_fails() {
        let target = data(vec![("arr", Value::from(vec![1, 2, 3]))]);
        let patch = Patch::new().with_action(
            PatchAction::new().update("foo", data(vec![("bar", Value::Int(1))])),
        );
        assert_eq!(
            patch.apply(&target),
            Err(DataError::InvalidQuery {
                query: "foo".into()
            })
        );
    }

    #[test]
    fn test_non_mapping_update_target_fails() {
        let target = data(vec![("foo", Value::Int(123))]);
        let patch = Patch::new().with_action(
            PatchAction::new().update("foo", data(vec![("bar", Value::Int(1))])),
        );
        assert_eq!(
            patch.apply(&target),
            Err(DataError::UnsupportedMergeTarget {
                query: "foo".into()
            })
        );
    }

    #[test]
    fn test_apply_leaves_source_untouched_on_error() {
        let target = data(vec![("a", Value::Int(1)), ("foo", Value::Int(123))]);
        let patch = Patch::new()
            .with_action(PatchAction::new().delete("a"))
            .with_action(PatchAction::new().update("foo", data(vec![("x", Value::Int(1))])));

        assert!(patch.apply(&target).is_err());
        assert_eq!(target.query("a"), Some(&Value::Int(1)));

        let mut live = target.clone();
        assert!(patch.apply_to(&mut live).is_err());
        // the first action already ran
        assert_eq!(live.query("a"), None);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let target = data(vec![("a", Value::Int(1))]);
        let patch = Patch::new();
        assert!(patch.is_empty());
        assert_eq!(patch.apply(&target).unwrap(), target);
    }
}
