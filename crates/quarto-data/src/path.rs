/*
 * path.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Dot-path addressing into values.
 *
 * A path such as `a.0.c` walks `a` as a mapping key, `0` as a sequence
 * index and `c` as a mapping key again. The same grammar is used for reads,
 * writes, deletes and patch targets.
 */

use crate::error::{DataError, Result};
use crate::value::Value;
use std::fmt;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// An address into a [`Value`]: an ordered list of segments, each either a
/// mapping key or a decimal sequence index.
///
/// The zero-length path addresses the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The zero-length path.
    pub fn root() -> Self {
        Path::default()
    }

    /// Split a dot-delimited query into a path.
    ///
    /// The empty string is the zero-length path. No other input is special:
    /// `"a..b"` has an empty middle segment.
    pub fn parse(query: &str) -> Self {
        if query.is_empty() {
            return Path::root();
        }

        Path {
            segments: query.split(PATH_SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Build a path from explicit segments.
    ///
    /// Unlike [`Path::parse`], segments may contain `.`, which makes keys such
    /// as `"fake.query"` addressable.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment, returning the extended path.
    pub fn child(&self, segment: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Path { segments }
    }

    /// Parent segments and final segment, or `None` for the zero-length path.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(last, parents)| (parents, last.as_str()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(query: &str) -> Self {
        Path::parse(query)
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        Path::from_segments(segments.iter().copied())
    }
}

/// Parse a sequence index segment: ASCII digits only, no sign.
pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    segment.parse().ok()
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Mapping(map) => map.get(segment),
        Value::Sequence(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Mapping(map) => map.get_mut(segment),
        Value::Sequence(items) => parse_index(segment).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

fn walk_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| child_mut(node, segment))
}

impl Value {
    /// Resolve `path`, returning `None` if any segment does not resolve.
    pub fn get(&self, path: &Path) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| child(node, segment))
    }

    /// Resolve a dot-delimited query. See [`Path::parse`].
    pub fn query(&self, query: &str) -> Option<&Value> {
        self.get(&Path::parse(query))
    }

    /// Resolve `path` for in-place mutation.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        walk_mut(self, path.segments())
    }

    /// Store `value` at `path`, returning whatever was there before.
    ///
    /// Everything up to the final segment must already exist. A mapping parent
    /// gains (or replaces) the key; a sequence parent needs an in-range index.
    /// The zero-length path replaces the whole value.
    pub fn set(&mut self, path: &Path, value: Value) -> Result<Option<Value>> {
        let Some((parents, last)) = path.split_last() else {
            return Ok(Some(std::mem::replace(self, value)));
        };

        let parent =
            walk_mut(self, parents).ok_or_else(|| DataError::invalid_query(path.to_string()))?;

        match parent {
            Value::Mapping(map) => Ok(map.insert(last.to_string(), value)),
            Value::Sequence(items) => {
                let slot = parse_index(last)
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| malformed(path, last))?;
                Ok(Some(std::mem::replace(slot, value)))
            }
            _ => Err(malformed(path, last)),
        }
    }

    /// Remove the value at `path`, returning it.
    ///
    /// Deleting something that does not exist is a no-op. Removing a sequence
    /// element shifts the following elements down. Deleting the zero-length
    /// path clears the value to an empty mapping.
    pub fn delete(&mut self, path: &Path) -> Option<Value> {
        let Some((parents, last)) = path.split_last() else {
            return Some(std::mem::replace(self, Value::empty_mapping()));
        };

        match walk_mut(self, parents)? {
            Value::Mapping(map) => map.shift_remove(last),
            Value::Sequence(items) => {
                let index = parse_index(last)?;
                (index < items.len()).then(|| items.remove(index))
            }
            _ => None,
        }
    }

    /// Copy of this value with `value` stored at `path`; `self` is untouched.
    pub fn with(&self, path: &Path, value: Value) -> Result<Value> {
        let mut copy = self.clone();
        copy.set(path, value)?;
        Ok(copy)
    }

    /// Copy of this value with `path` removed; `self` is untouched.
    pub fn without(&self, path: &Path) -> Value {
        let mut copy = self.clone();
        copy.delete(path);
        copy
    }
}

fn malformed(path: &Path, segment: &str) -> DataError {
    DataError::MalformedPath {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}
