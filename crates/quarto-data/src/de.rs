/*
 * de.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Reading canonical values back into host types.
 *
 * `&Value` is a serde `Deserializer`, so anything `Deserialize` can be read
 * straight out of a document without going through text. Numbers are
 * lenient the same way the text codec is: an integer target accepts `Int`,
 * `UInt` and integral `Float` values, a float target accepts any number.
 */

use crate::data::Data;
use crate::error::{DataError, Result};
use crate::path::Path;
use crate::value::{Mapping, Value, integral_i64, integral_u64};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, Deserialize, DeserializeSeed, Deserializer as _, Error as _, IntoDeserializer,
    Unexpected, Visitor,
};
use serde::forward_to_deserialize_any;

/// Decode a host value from a canonical value.
pub fn from_value<'de, T>(value: &'de Value) -> Result<T>
where
    T: Deserialize<'de>,
{
    T::deserialize(value)
}

impl Data {
    /// Decode the whole document, usually into a struct or map.
    pub fn decode<'de, T>(&'de self) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        from_value(self.as_value())
    }

    /// Decode the value at a dot-delimited query.
    ///
    /// A query that does not resolve is not an error and yields `Ok(None)`;
    /// a value that resolves but has the wrong shape is a `Decode` error.
    pub fn decode_query<'de, T>(&'de self, query: &str) -> Result<Option<T>>
    where
        T: Deserialize<'de>,
    {
        self.decode_path(&Path::parse(query))
    }

    /// Decode the value at `path`. See [`Data::decode_query`].
    pub fn decode_path<'de, T>(&'de self, path: &Path) -> Result<Option<T>>
    where
        T: Deserialize<'de>,
    {
        self.get(path).map(from_value::<T>).transpose()
    }
}

impl Value {
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Null => Unexpected::Unit,
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::Int(i) => Unexpected::Signed(*i),
            Value::UInt(u) => Unexpected::Unsigned(*u),
            Value::Float(f) => Unexpected::Float(*f),
            Value::String(s) => Unexpected::Str(s),
            Value::Sequence(_) => Unexpected::Seq,
            Value::Mapping(_) => Unexpected::Map,
        }
    }

    fn deserialize_integer<'de, V>(&'de self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if let Value::Float(f) = self {
            if let Some(i) = integral_i64(*f) {
                return visitor.visit_i64(i);
            }
            if let Some(u) = integral_u64(*f) {
                return visitor.visit_u64(u);
            }
        }
        de::Deserializer::deserialize_any(self, visitor)
    }
}

macro_rules! deserialize_integers {
    ($($method:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                self.deserialize_integer(visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for &'de Value {
    type Error = DataError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Int(i) => visitor.visit_i64(*i),
            Value::UInt(u) => visitor.visit_u64(*u),
            Value::Float(f) => visitor.visit_f64(*f),
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Sequence(items) => visit_sequence(items, visitor),
            Value::Mapping(map) => visit_mapping(map, visitor),
        }
    }

    deserialize_integers! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// Unit variants are strings; every other variant is a single-entry
    /// mapping from the variant name to its content.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::String(s) => visitor.visit_enum(BorrowedStrDeserializer::<DataError>::new(s)),
            Value::Mapping(map) if map.len() == 1 => match map.first() {
                Some((variant, value)) => visitor.visit_enum(EnumAccess {
                    variant: variant.as_str(),
                    value,
                }),
                None => Err(DataError::invalid_type(self.unexpected(), &visitor)),
            },
            other => Err(DataError::invalid_type(other.unexpected(), &visitor)),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool f32 f64 char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier
    }
}

impl<'de> IntoDeserializer<'de, DataError> for &'de Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn visit_sequence<'de, V>(items: &'de [Value], visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let len = items.len();
    let mut access = SeqAccess { iter: items.iter() };
    let value = visitor.visit_seq(&mut access)?;

    if access.iter.len() == 0 {
        Ok(value)
    } else {
        Err(DataError::invalid_length(len, &"fewer elements in sequence"))
    }
}

fn visit_mapping<'de, V>(map: &'de Mapping, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let len = map.len();
    let mut access = MapAccess {
        iter: map.iter(),
        value: None,
    };
    let value = visitor.visit_map(&mut access)?;

    if access.iter.len() == 0 {
        Ok(value)
    } else {
        Err(DataError::invalid_length(len, &"fewer entries in mapping"))
    }
}

struct SeqAccess<'de> {
    iter: std::slice::Iter<'de, Value>,
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'de> {
    type Error = DataError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        self.iter.next().map(|item| seed.deserialize(item)).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapAccess<'de> {
    iter: indexmap::map::Iter<'de, String, Value>,
    value: Option<&'de Value>,
}

impl<'de> de::MapAccess<'de> for MapAccess<'de> {
    type Error = DataError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(KeyDeserializer { key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(DataError::decode("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Mapping keys are text; numeric and boolean host keys are parsed back.
struct KeyDeserializer<'de> {
    key: &'de str,
}

macro_rules! deserialize_parsed_keys {
    ($($method:ident => $visit:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                match self.key.parse() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(_) => visitor.visit_borrowed_str(self.key),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = DataError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    deserialize_parsed_keys! {
        deserialize_bool => visit_bool
        deserialize_i8 => visit_i8
        deserialize_i16 => visit_i16
        deserialize_i32 => visit_i32
        deserialize_i64 => visit_i64
        deserialize_i128 => visit_i128
        deserialize_u8 => visit_u8
        deserialize_u16 => visit_u16
        deserialize_u32 => visit_u32
        deserialize_u64 => visit_u64
        deserialize_u128 => visit_u128
        deserialize_f32 => visit_f32
        deserialize_f64 => visit_f64
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        BorrowedStrDeserializer::<DataError>::new(self.key).deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf option unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct EnumAccess<'de> {
    variant: &'de str,
    value: &'de Value,
}

impl<'de> de::EnumAccess<'de> for EnumAccess<'de> {
    type Error = DataError;
    type Variant = VariantAccess<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantAccess<'de>)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(BorrowedStrDeserializer::<DataError>::new(self.variant))?;
        Ok((variant, VariantAccess { value: self.value }))
    }
}

struct VariantAccess<'de> {
    value: &'de Value,
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'de> {
    type Error = DataError;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(DataError::invalid_type(other.unexpected(), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self.value, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self.value, visitor)
    }
}
