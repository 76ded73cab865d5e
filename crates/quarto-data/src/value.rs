/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The canonical value model.
 *
 * Every piece of data handled by this crate is collapsed into `Value`:
 * integers of any width become `Int`/`UInt`, floats become `Float`, and
 * containers own their children outright so that no two trees ever share
 * storage.
 */

use indexmap::IndexMap;
use std::fmt;

/// String-keyed mapping of values.
///
/// Insertion order is kept for iteration but is not significant for equality
/// or for encoding (keys are sorted when written).
pub type Mapping = IndexMap<String, Value>;

/// 2^63 and 2^64 as floats: the first values above the `i64`/`u64` ranges.
pub(crate) const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
pub(crate) const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// A canonical, dynamically-typed data value.
///
/// Equality is structural, with numbers compared by value: `Int(3)`,
/// `UInt(3)` and `Float(3.0)` are all equal, so a value compares equal to
/// itself after a trip through the text form.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::UInt(u)) | (Value::UInt(u), Value::Int(i)) => {
                u64::try_from(*i).is_ok_and(|i| i == *u)
            }
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                integral_i64(*f) == Some(*i)
            }
            (Value::UInt(u), Value::Float(f)) | (Value::Float(f), Value::UInt(u)) => {
                integral_u64(*f) == Some(*u)
            }
            _ => false,
        }
    }
}

/// `f` as an `i64`, if it is a whole number inside the `i64` range.
pub(crate) fn integral_i64(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f)).then_some(f as i64)
}

/// `f` as a `u64`, if it is a whole number inside the `u64` range.
pub(crate) fn integral_u64(f: f64) -> Option<u64> {
    (f.fract() == 0.0 && (0.0..U64_BOUND).contains(&f)).then_some(f as u64)
}

/// The variant tag of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    String,
    Sequence,
    Mapping,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// Element shape of a sequence, derived from its elements.
///
/// Sequences carry no declared element type, so the shape is what the merge
/// engine compares when deciding between appending and replacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No elements. Only another empty sequence shares this shape.
    Empty,
    /// Every element has the same variant.
    Uniform(ValueKind),
    /// Elements of different variants.
    Mixed,
}

impl Shape {
    /// Compute the shape of a slice of values.
    pub fn of(items: &[Value]) -> Shape {
        let mut kinds = items.iter().map(Value::kind);

        match kinds.next() {
            None => Shape::Empty,
            Some(first) => {
                if kinds.all(|kind| kind == first) {
                    Shape::Uniform(first)
                } else {
                    Shape::Mixed
                }
            }
        }
    }

    /// Whether a sequence of shape `other` can be appended to one of this shape.
    ///
    /// Only identical shapes append. An empty sequence has a shape of its own,
    /// so it neither absorbs nor is absorbed by a non-empty one.
    pub fn is_compatible(&self, other: &Shape) -> bool {
        self == other
    }
}

impl Value {
    /// An empty mapping, the canonical "no data" value.
    pub fn empty_mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Mapping(_) => ValueKind::Mapping,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    /// Check if this is a container (sequence or mapping).
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Sequence(_) | Value::Mapping(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as `i64` if this is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Get as `u64` if this is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// Get as `f64` if this is any number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Element shape, if this is a sequence.
    pub fn shape(&self) -> Option<Shape> {
        self.as_sequence().map(Shape::of)
    }

    /// Whether this value counts as "empty" for `omit_empty` encoding:
    /// null, `false`, zero, the empty string, or an empty container.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::UInt(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Sequence(items) => items.is_empty(),
            Value::Mapping(map) => map.is_empty(),
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::UInt(u64::from(n))
                }
            }
        )*
    };
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(n: isize) -> Self {
        // isize is at most 64 bits on every supported target
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::UInt(n as u64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
