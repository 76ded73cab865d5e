/*
 * data.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The top-level data document.
 */

use crate::error::{DataError, Result};
use crate::merge::{merge, merge_mapping};
use crate::path::Path;
use crate::value::{Mapping, Value};

/// A data document: a mapping of canonical values.
///
/// `Data` is what gets merged, patched and persisted. Holders treat it as
/// immutable; the mutating methods need `&mut self`, so a document somebody
/// else can still read is never changed behind their back. Use
/// [`Patch::apply`](crate::Patch::apply) or `clone()` to get a private copy.
///
/// The default value is the empty document, which encodes as `{}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    // Always a `Value::Mapping`.
    root: Value,
}

impl Default for Data {
    fn default() -> Self {
        Data {
            root: Value::empty_mapping(),
        }
    }
}

impl Data {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(entries: Mapping) -> Self {
        Data {
            root: Value::Mapping(entries),
        }
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// The top-level entries.
    pub fn entries(&self) -> &Mapping {
        match &self.root {
            Value::Mapping(map) => map,
            _ => unreachable!("data root is always a mapping"),
        }
    }

    /// Mutable access to the top-level entries.
    pub fn entries_mut(&mut self) -> &mut Mapping {
        match &mut self.root {
            Value::Mapping(map) => map,
            _ => unreachable!("data root is always a mapping"),
        }
    }

    /// The document as a value (always a mapping).
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn into_mapping(self) -> Mapping {
        match self.root {
            Value::Mapping(map) => map,
            _ => unreachable!("data root is always a mapping"),
        }
    }

    /// Resolve `path`; the zero-length path yields the whole document.
    pub fn get(&self, path: &Path) -> Option<&Value> {
        self.root.get(path)
    }

    /// Resolve a dot-delimited query, e.g. `a.0.c`.
    pub fn query(&self, query: &str) -> Option<&Value> {
        self.root.query(query)
    }

    /// Resolve `path` for in-place mutation.
    ///
    /// The zero-length path yields `None`; use [`Data::entries_mut`] for the
    /// root so it cannot be replaced by a non-mapping.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        if path.is_root() {
            return None;
        }

        self.root.get_mut(path)
    }

    /// Store `value` at `path`. See [`Value::set`].
    ///
    /// Replacing the whole document requires a mapping (or `Null`, which
    /// clears it).
    pub fn set(&mut self, path: &Path, value: Value) -> Result<Option<Value>> {
        if path.is_root() {
            let replacement = Data::try_from(value)?;
            return Ok(Some(std::mem::replace(&mut self.root, replacement.root)));
        }

        self.root.set(path, value)
    }

    /// Remove the value at `path`. See [`Value::delete`].
    pub fn delete(&mut self, path: &Path) -> Option<Value> {
        self.root.delete(path)
    }

    /// Remove every value addressed by `queries`.
    ///
    /// If any query is empty the whole document is cleared and the others are
    /// not looked at.
    pub fn delete_all<I, S>(&mut self, queries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries: Vec<S> = queries.into_iter().collect();

        if queries.iter().any(|q| q.as_ref().is_empty()) {
            self.entries_mut().clear();
            return;
        }

        for query in &queries {
            self.delete(&Path::parse(query.as_ref()));
        }
    }

    /// Merge documents left to right into a new, independent document.
    ///
    /// Same-named keys are merged deeply: mappings key by key, sequences of
    /// the same shape by appending, anything else by letting the later value
    /// win. `Null` values never overwrite.
    pub fn merge(items: &[Data]) -> Data {
        Data {
            root: merge(items.iter().map(Data::as_value)),
        }
    }

    /// Merge `sources` into this document in place, left to right.
    pub fn merge_from<'a, I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = &'a Data>,
    {
        for source in sources {
            merge_mapping(self.entries_mut(), source.entries());
        }
    }
}

impl TryFrom<Value> for Data {
    type Error = DataError;

    /// A mapping becomes the document; `Null` becomes the empty document.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Mapping(map) => Ok(Data::from_mapping(map)),
            Value::Null => Ok(Data::default()),
            other => Err(DataError::RootNotMapping {
                kind: other.kind().to_string(),
            }),
        }
    }
}

impl From<Mapping> for Data {
    fn from(entries: Mapping) -> Self {
        Data::from_mapping(entries)
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        data.into_value()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Data::from_mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
