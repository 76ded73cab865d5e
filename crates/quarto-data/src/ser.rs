/*
 * ser.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Building canonical values from host types.
 *
 * Any `T: Serialize` can be turned into a `Value`. Field naming and
 * skipping follow the usual serde attributes:
 *
 * - `#[serde(rename = "...")]` sets the key used for a field
 * - `#[serde(skip)]` leaves a field out
 * - `#[serde(flatten)]` lifts a nested struct's fields into the parent
 * - `#[serde(skip_serializing_if = "...")]` omits a field conditionally
 *
 * `Encoder::omit_empty` additionally drops every struct field whose value is
 * empty (see `Value::is_empty_value`).
 */

use crate::data::Data;
use crate::error::{DataError, Result};
use crate::value::{Mapping, Value};
use serde::ser::{self, Serialize, Serializer as _};

/// Converts host values into canonical values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    /// Drop struct fields whose encoded value is empty.
    pub omit_empty: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_omit_empty(mut self, omit_empty: bool) -> Self {
        self.omit_empty = omit_empty;
        self
    }

    /// Encode any serializable value.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` if the top-level value itself cannot be represented.
    /// Unsupported values nested inside containers become `Null` instead.
    pub fn encode_value<T>(&self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ValueSerializer {
            omit_empty: self.omit_empty,
        })
    }

    /// Encode a struct or map into a document.
    ///
    /// `None`/unit encodes as the empty document; any other non-mapping
    /// value is a `RootNotMapping` error.
    pub fn encode<T>(&self, value: &T) -> Result<Data>
    where
        T: ?Sized + Serialize,
    {
        Data::try_from(self.encode_value(value)?)
    }
}

/// Encode any serializable value with default options.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    Encoder::default().encode_value(value)
}

/// Encode a struct or map into a document with default options.
pub fn to_data<T>(value: &T) -> Result<Data>
where
    T: ?Sized + Serialize,
{
    Encoder::default().encode(value)
}

/// Serialize a nested element, turning unsupported values into `Null`.
fn element<T>(value: &T, ser: ValueSerializer) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    match value.serialize(ser) {
        Err(DataError::UnsupportedType { message }) => {
            tracing::debug!(%message, "Dropping unsupported value");
            Ok(Value::Null)
        }
        other => other,
    }
}

/// Mapping keys are strings; scalar host keys are written in their text form.
fn key_string(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        other => Err(DataError::unsupported(format!(
            "map key must be a scalar, found {}",
            other.kind()
        ))),
    }
}

#[derive(Debug, Clone, Copy)]
struct ValueSerializer {
    omit_empty: bool,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = DataError;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = VariantSeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = VariantStructSerializer;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        if let Ok(i) = i64::try_from(v) {
            Ok(Value::Int(i))
        } else if let Ok(u) = u64::try_from(v) {
            Ok(Value::UInt(u))
        } else {
            Err(DataError::unsupported(format!("integer {} out of range", v)))
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        u64::try_from(v)
            .map(Value::UInt)
            .map_err(|_| DataError::unsupported(format!("integer {} out of range", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Sequence(v.iter().copied().map(Value::from).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut entries = Mapping::new();
        entries.insert(variant.to_string(), element(value, self)?);
        Ok(Value::Mapping(entries))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer> {
        Ok(SeqSerializer {
            ser: self,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqSerializer> {
        Ok(VariantSeqSerializer {
            variant,
            inner: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer> {
        Ok(MapSerializer {
            ser: self,
            entries: Mapping::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructSerializer> {
        Ok(StructSerializer {
            ser: self,
            entries: Mapping::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantStructSerializer> {
        Ok(VariantStructSerializer {
            variant,
            inner: self.serialize_struct(variant, len)?,
        })
    }
}

struct SeqSerializer {
    ser: ValueSerializer,
    items: Vec<Value>,
}

impl SeqSerializer {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(element(value, self.ser)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Sequence(self.items))
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Sequence(self.items))
    }
}

struct VariantSeqSerializer {
    variant: &'static str,
    inner: SeqSerializer,
}

impl ser::SerializeTupleVariant for VariantSeqSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.inner.push(value)
    }

    fn end(self) -> Result<Value> {
        let mut entries = Mapping::new();
        entries.insert(
            self.variant.to_string(),
            Value::Sequence(self.inner.items),
        );
        Ok(Value::Mapping(entries))
    }
}

struct MapSerializer {
    ser: ValueSerializer,
    entries: Mapping,
    // `None` after an unsupported key: the matching value is dropped too.
    next_key: Option<String>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(self.ser).and_then(key_string);

        self.next_key = match key {
            Ok(key) => Some(key),
            Err(DataError::UnsupportedType { message }) => {
                tracing::debug!(%message, "Dropping map entry with unsupported key");
                None
            }
            Err(err) => return Err(err),
        };

        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Some(key) = self.next_key.take() {
            let value = element(value, self.ser)?;
            self.entries.insert(key, value);
        }

        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Mapping(self.entries))
    }
}

struct StructSerializer {
    ser: ValueSerializer,
    entries: Mapping,
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = element(value, self.ser)?;

        if self.ser.omit_empty && value.is_empty_value() {
            return Ok(());
        }

        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Mapping(self.entries))
    }
}

struct VariantStructSerializer {
    variant: &'static str,
    inner: StructSerializer,
}

impl ser::SerializeStructVariant for VariantStructSerializer {
    type Ok = Value;
    type Error = DataError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Value> {
        let mut entries = Mapping::new();
        entries.insert(
            self.variant.to_string(),
            Value::Mapping(self.inner.entries),
        );
        Ok(Value::Mapping(entries))
    }
}
