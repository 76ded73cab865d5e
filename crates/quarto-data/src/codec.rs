/*
 * codec.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Text encoding of data documents.
 *
 * The storage form is a type tag followed by a body:
 *
 *     '<' tag '>' body
 *
 * The only tag is `json`, whose body is a JSON object, e.g.
 * `<json>{"hello":"world!"}`. Keys are always written in ascending order so
 * the output is stable.
 */

use crate::data::Data;
use crate::error::{DataError, Result};
use crate::value::{Mapping, Value, integral_i64, integral_u64};
use serde::ser::Serializer;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::str::FromStr;

pub const FORMAT_BEGIN: &str = "<";
pub const FORMAT_END: &str = ">";
pub const JSON_FORMAT: &str = "json";

/// Layout of encoded JSON bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// No insignificant whitespace.
    #[default]
    Compact,
    /// One entry per line, indented with a tab per level.
    Pretty,
}

impl Data {
    /// Parse the storage form `<tag>body`.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the tag marker is missing, the body is not valid
    ///   JSON, or the JSON is not an object
    /// - `UnrecognizedFormat` if the tag is not `json`
    pub fn parse(s: &str) -> Result<Data> {
        let rest = s
            .strip_prefix(FORMAT_BEGIN)
            .ok_or_else(|| DataError::invalid_format("missing format tag"))?;
        let (tag, body) = rest
            .split_once(FORMAT_END)
            .ok_or_else(|| DataError::invalid_format("unterminated format tag"))?;

        match tag {
            JSON_FORMAT => Data::from_json_str(body),
            _ => Err(DataError::UnrecognizedFormat {
                tag: tag.to_string(),
            }),
        }
    }

    /// Parse a bare JSON object (no format tag).
    pub fn from_json_str(body: &str) -> Result<Data> {
        let json: serde_json::Value = serde_json::from_str(body)
            .map_err(|err| DataError::invalid_format(format!("invalid JSON: {}", err)))?;
        Data::from_json(json)
    }

    /// Convert a parsed JSON value, which must be an object.
    pub fn from_json(json: serde_json::Value) -> Result<Data> {
        match json {
            serde_json::Value::Object(object) => Ok(Data::from_mapping(mapping_from_json(object))),
            other => Err(DataError::invalid_format(format!(
                "JSON must be an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Encode the JSON body. The empty document is always `{}`.
    pub fn to_json(&self, style: JsonStyle) -> Result<String> {
        if self.is_empty() {
            return Ok("{}".to_string());
        }

        let encoded = match style {
            JsonStyle::Compact => serde_json::to_string(self.as_value()),
            JsonStyle::Pretty => {
                let mut buf = Vec::new();
                let written = {
                    let formatter = PrettyFormatter::with_indent(b"\t");
                    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                    self.as_value().serialize(&mut ser)
                };
                written.map(|()| String::from_utf8_lossy(&buf).into_owned())
            }
        };

        encoded.map_err(|err| DataError::invalid_format(err.to_string()))
    }

    /// Storage form laid out for reading: `<json>`, a newline, pretty JSON.
    pub fn pretty_string(&self) -> Result<String> {
        Ok(format!(
            "{}{}{}\n{}",
            FORMAT_BEGIN,
            JSON_FORMAT,
            FORMAT_END,
            self.to_json(JsonStyle::Pretty)?
        ))
    }
}

/// Compact storage form, parseable with [`Data::parse`].
impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.to_json(JsonStyle::Compact).map_err(|_| fmt::Error)?;
        write!(f, "{}{}{}{}", FORMAT_BEGIN, JSON_FORMAT, FORMAT_END, body)
    }
}

impl FromStr for Data {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Data::parse(s)
    }
}

/// JSON to canonical value.
///
/// Integral numbers inside the `i64` range become `Int`, every other number
/// becomes `Float`.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number_from_json(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Mapping(mapping_from_json(object)),
        }
    }
}

fn mapping_from_json(object: serde_json::Map<String, serde_json::Value>) -> Mapping {
    object
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect()
}

fn number_from_json(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Int(i);
    }

    match n.as_f64() {
        Some(f) => integral_i64(f).map_or(Value::Float(f), Value::Int),
        None => Value::Null,
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            // Whole floats are written as integers, which is how they read back.
            Value::Float(f) => match (integral_i64(*f), integral_u64(*f)) {
                (Some(i), _) => serializer.serialize_i64(i),
                (None, Some(u)) => serializer.serialize_u64(u),
                (None, None) => serializer.serialize_f64(*f),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Mapping(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                serializer.collect_map(entries)
            }
        }
    }
}

/// Keeps each number in the variant the source reports it as. The JSON
/// number rule belongs to [`Data`] parsing, not to `Value` itself.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any data value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Mapping::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.insert(key, value);
        }
        Ok(Value::Mapping(entries))
    }
}

impl Serialize for Data {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_value().serialize(serializer)
    }
}

/// Deserializes a JSON-like object with the same number rules as
/// [`Data::parse`]. Anything but an object is an error.
impl<'de> Deserialize<'de> for Data {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Data::from_json(json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        entries.into_iter().collect()
    }

    fn complex_data() -> Data {
        [
            ("int", Value::Int(123)),
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("float", Value::Float(12.34)),
            ("string", "string".into()),
            ("map", map(vec![("m", "m".into())])),
            (
                "array",
                Value::Sequence(vec![
                    map(vec![("d1", Value::Int(1))]),
                    map(vec![("d2", "2".into())]),
                ]),
            ),
            ("ints", Value::from(vec![3i64, 2, 1])),
            ("floats", Value::from(vec![5.5, 4.5, 3.5])),
            ("strings", Value::from(vec!["s1", "s2", "s3"])),
            (
                "any",
                Value::Sequence(vec![Value::Int(1), "2".into(), Value::Float(3.3)]),
            ),
        ]
        .into_iter()
        .collect()
    }

    const COMPLEX_DATA_COMPACT: &str = r#"{"any":[1,"2",3.3],"array":[{"d1":1},{"d2":"2"}],"false":false,"float":12.34,"floats":[5.5,4.5,3.5],"int":123,"ints":[3,2,1],"map":{"m":"m"},"string":"string","strings":["s1","s2","s3"],"true":true}"#;

    #[test]
    fn test_empty_encodes_as_braces() {
        let data = Data::default();
        assert_eq!(data.to_json(JsonStyle::Compact).unwrap(), "{}");
        assert_eq!(data.to_json(JsonStyle::Pretty).unwrap(), "{}");
        assert_eq!(data.to_string(), "<json>{}");
        assert_eq!(data.pretty_string().unwrap(), "<json>\n{}");
    }

    #[test]
    fn test_pretty_output_sorts_keys() {
        let data = complex_data();
        insta::assert_snapshot!(data.pretty_string().unwrap(), @r#"
<json>
{
	"any": [
		1,
		"2",
		3.3
	],
	"array": [
		{
			"d1": 1
		},
		{
			"d2": "2"
		}
	],
	"false": false,
	"float": 12.34,
	"floats": [
		5.5,
		4.5,
		3.5
	],
	"int": 123,
	"ints": [
		3,
		2,
		1
	],
	"map": {
		"m": "m"
	},
	"string": "string",
	"strings": [
		"s1",
		"s2",
		"s3"
	],
	"true": true
}
"#);
        assert_eq!(
            data.pretty_string().unwrap(),
            format!("<json>\n{}", data.to_json(JsonStyle::Pretty).unwrap())
        );
    }

    #[test]
    fn test_compact_output() {
        let data = complex_data();
        insta::assert_snapshot!(
            data.to_string(),
            @r#"<json>{"any":[1,"2",3.3],"array":[{"d1":1},{"d2":"2"}],"false":false,"float":12.34,"floats":[5.5,4.5,3.5],"int":123,"ints":[3,2,1],"map":{"m":"m"},"string":"string","strings":["s1","s2","s3"],"true":true}"#
        );
    }

    #[test]
    fn test_whole_floats_encode_as_integers() {
        let data: Data = [
            ("ratio", Value::Float(3.0)),
            ("neg", Value::Float(-2.0)),
            ("half", Value::Float(0.5)),
            ("huge", Value::Float(1e19)),
            ("beyond", Value::Float(1e20)),
        ]
        .into_iter()
        .collect();

        let text = data.to_string();
        insta::assert_snapshot!(
            text,
            @r#"<json>{"beyond":1e20,"half":0.5,"huge":10000000000000000000,"neg":-2,"ratio":3}"#
        );

        let back = Data::parse(&text).unwrap();
        assert_eq!(back, data);
        assert_eq!(back.to_string(), text);
        assert_eq!(
            Data::parse(&back.pretty_string().unwrap()).unwrap().to_string(),
            text
        );
    }

    #[test]
    fn test_value_deserialize_keeps_number_variants() {
        let value: Value = serde_json::from_str(r#"[1, -1, 18446744073709551615, 2.0]"#).unwrap();
        assert!(matches!(
            value.as_sequence(),
            Some([Value::UInt(1), Value::Int(-1), Value::UInt(u64::MAX), Value::Float(f)]) if *f == 2.0
        ));

        let value: Value = serde_json::from_str(r#"{"b": null, "a": "x"}"#).unwrap();
        let keys: Vec<&str> = value
            .as_mapping()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_parse_round_trip() {
        let text = format!("<json>{}", COMPLEX_DATA_COMPACT);
        assert_eq!(Data::parse(&text).unwrap(), complex_data());
        assert_eq!(text.parse::<Data>().unwrap(), complex_data());
        assert_eq!(Data::parse("<json>{}").unwrap(), Data::default());
    }

    #[test]
    fn test_parse_pretty_form() {
        let data = complex_data();
        assert_eq!(Data::parse(&data.pretty_string().unwrap()).unwrap(), data);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Data::parse(r#"{"a":1}"#),
            Err(DataError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Data::parse(r#"<json{"a":1}"#),
            Err(DataError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Data::parse(r#"<json>{"a":1,}"#),
            Err(DataError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Data::parse("<json>1"),
            Err(DataError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Data::parse("<json>[1, 2]"),
            Err(DataError::InvalidFormat { .. })
        ));
        assert_eq!(
            Data::parse(r#"<bson>{"a":1}"#),
            Err(DataError::UnrecognizedFormat { tag: "bson".into() })
        );
    }

    #[test]
    fn test_number_rules() {
        let data = Data::from_json_str(
            r#"{"i": 123, "f": 123.0, "h": 2.5, "neg": -7, "big": 18446744073709551615, "e": 1e3}"#,
        )
        .unwrap();
        assert_eq!(data.query("i"), Some(&Value::Int(123)));
        assert_eq!(data.query("f"), Some(&Value::Int(123)));
        assert_eq!(data.query("h"), Some(&Value::Float(2.5)));
        assert_eq!(data.query("neg"), Some(&Value::Int(-7)));
        assert_eq!(data.query("e"), Some(&Value::Int(1000)));
        assert!(matches!(data.query("big"), Some(Value::Float(_))));
    }

    #[test]
    fn test_no_html_escaping() {
        let data: Data = [("html", "<b>&</b>")].into_iter().collect();
        assert_eq!(data.to_string(), r#"<json>{"html":"<b>&</b>"}"#);
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        let data: Data = [("nan", Value::Float(f64::NAN))].into_iter().collect();
        assert_eq!(data.to_string(), r#"<json>{"nan":null}"#);
    }

    #[test]
    fn test_serde_embedding() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Holder {
            a: i32,
            data: Data,
        }

        let holder: Holder = serde_json::from_str(
            r#"{"a":123, "data":{"int":123.0, "float":2.5, "strings":["s1", "s2"]}}"#,
        )
        .unwrap();
        assert_eq!(holder.a, 123);
        assert_eq!(holder.data.query("int"), Some(&Value::Int(123)));
        assert_eq!(holder.data.query("float"), Some(&Value::Float(2.5)));
        assert_eq!(
            holder.data.query("strings"),
            Some(&Value::from(vec!["s1", "s2"]))
        );

        let text = serde_json::to_string(&holder).unwrap();
        assert_eq!(
            text,
            r#"{"a":123,"data":{"float":2.5,"int":123,"strings":["s1","s2"]}}"#
        );

        let bad: std::result::Result<Holder, _> =
            serde_json::from_str(r#"{"a":1, "data":["s1", "s2"]}"#);
        assert!(bad.is_err());
    }
}
