//! The codec seam and its JSON implementation.

use base64::Engine;
use bytes::Bytes;

use crate::convert::number_to_value;
use crate::{Error, Format, Map, Value};

/// Key of the single-entry object JSON uses to carry `Value::Bytes`.
const BYTES_TAG: &str = "$bytes";

/// Key of the single-entry object wrapping a map whose own keys include a tag.
const MAP_TAG: &str = "$map";

/// Turns a `Value` into bytes and back.
///
/// A store only ever persists one thing: its whole dictionary. The snapshot
/// methods cover that case; `decode_snapshot` rejects anything whose top
/// level is not a map.
pub trait Codec: Send + Sync {
    /// The format this codec reads and writes.
    fn format(&self) -> Format;

    /// Decode raw bytes into a Value.
    fn decode(&self, bytes: &[u8]) -> Result<Value, Error>;

    /// Encode a Value into raw bytes.
    fn encode(&self, value: &Value) -> Result<Bytes, Error>;

    /// Encode a whole dictionary.
    fn encode_snapshot(&self, entries: &Map) -> Result<Bytes, Error>;

    /// Decode a whole dictionary.
    fn decode_snapshot(&self, bytes: &[u8]) -> Result<Map, Error> {
        match self.decode(bytes)? {
            Value::Map(entries) => Ok(entries),
            other => Err(Error::decode(
                self.format(),
                format!("snapshot must be a map, found {}", kind_name(&other)),
            )),
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Integer(_) | Value::Unsigned(_) | Value::Float(_) => "a number",
        Value::String(_) => "a string",
        Value::Bytes(_) => "bytes",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
    }
}

/// A codec that stores snapshots as JSON.
///
/// JSON is strict about what it can hold, so encoding fails on non-finite
/// floats instead of quietly writing `null`. `Value::Bytes` travels as
/// `{"$bytes": "<base64>"}` and comes back as bytes. A map that has a
/// `"$bytes"` or `"$map"` key of its own is written as `{"$map": {...}}`, so
/// user data is never mistaken for an envelope.
///
/// # Example
///
/// ```rust
/// use perdict_codec::{Codec, JsonCodec, Value};
///
/// let bytes = JsonCodec.encode(&Value::from("hello")).unwrap();
/// assert_eq!(&bytes[..], b"\"hello\"");
/// assert!(JsonCodec.encode(&Value::from(f64::NAN)).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    fn encode_value(&self, value: &Value) -> Result<serde_json::Value, Error> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Unsigned(u) => serde_json::Value::Number((*u).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    Error::encode(self.format(), format!("float {} has no JSON form", f))
                })?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(b);
                let mut tagged = serde_json::Map::new();
                tagged.insert(BYTES_TAG.to_string(), serde_json::Value::String(encoded));
                serde_json::Value::Object(tagged)
            }
            Value::Array(arr) => serde_json::Value::Array(
                arr.iter()
                    .map(|v| self.encode_value(v))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => self.encode_object(map)?,
        })
    }

    fn encode_object(&self, map: &Map) -> Result<serde_json::Value, Error> {
        let object = serde_json::Value::Object(self.encode_map(map)?);
        if map.contains_key(BYTES_TAG) || map.contains_key(MAP_TAG) {
            let mut escaped = serde_json::Map::new();
            escaped.insert(MAP_TAG.to_string(), object);
            Ok(serde_json::Value::Object(escaped))
        } else {
            Ok(object)
        }
    }

    fn encode_map(
        &self,
        map: &Map,
    ) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
        map.iter()
            .map(|(k, v)| {
                self.encode_value(v)
                    .map_err(|e| match e {
                        Error::Encode { format, message } => Error::Encode {
                            format,
                            message: format!("at key {:?}: {}", k, message),
                        },
                        other => other,
                    })
                    .map(|wire| (k.clone(), wire))
            })
            .collect()
    }

    fn decode_value(&self, json: serde_json::Value) -> Result<Value, Error> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number_to_value(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(
                arr.into_iter()
                    .map(|v| self.decode_value(v))
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(encoded)) = map.get(BYTES_TAG) {
                        let bytes = base64::engine::general_purpose::STANDARD
                            .decode(encoded)
                            .map_err(|e| Error::decode(self.format(), e.to_string()))?;
                        return Ok(Value::Bytes(bytes));
                    }
                    if matches!(map.get(MAP_TAG), Some(serde_json::Value::Object(_))) {
                        if let Some(serde_json::Value::Object(inner)) = map.remove(MAP_TAG) {
                            return Ok(Value::Map(self.decode_entries(inner)?));
                        }
                    }
                }
                Value::Map(self.decode_entries(map)?)
            }
        })
    }

    /// Decodes the entries of an object as a plain map, without tag checks.
    fn decode_entries(
        &self,
        map: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Map, Error> {
        map.into_iter()
            .map(|(k, v)| self.decode_value(v).map(|value| (k, value)))
            .collect()
    }
}

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::JSON
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, Error> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::decode(self.format(), e.to_string()))?;
        self.decode_value(json)
    }

    fn encode(&self, value: &Value) -> Result<Bytes, Error> {
        let json = self.encode_value(value)?;
        let bytes =
            serde_json::to_vec(&json).map_err(|e| Error::encode(self.format(), e.to_string()))?;
        Ok(Bytes::from(bytes))
    }

    fn encode_snapshot(&self, entries: &Map) -> Result<Bytes, Error> {
        let json = self.encode_object(entries)?;
        let bytes =
            serde_json::to_vec(&json).map_err(|e| Error::encode(self.format(), e.to_string()))?;
        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Map {
        let mut nested = Map::new();
        nested.insert("port".to_string(), Value::from(8080i64));
        nested.insert("ratio".to_string(), Value::from(0.25));

        let mut entries = Map::new();
        entries.insert("name".to_string(), Value::from("Alice"));
        entries.insert("blob".to_string(), Value::from(vec![0u8, 159, 146, 150]));
        entries.insert(
            "list".to_string(),
            Value::Array(vec![Value::Null, Value::from(true)]),
        );
        entries.insert("server".to_string(), Value::Map(nested));
        entries
    }

    #[test]
    fn snapshot_roundtrip() {
        let entries = sample();
        let bytes = JsonCodec.encode_snapshot(&entries).unwrap();
        let decoded = JsonCodec.decode_snapshot(&bytes).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn bytes_use_tagged_envelope() {
        let bytes = JsonCodec.encode(&Value::from(vec![1u8, 2, 3])).unwrap();
        assert_eq!(&bytes[..], br#"{"$bytes":"AQID"}"#);
    }

    #[test]
    fn non_finite_float_fails_to_encode() {
        let mut entries = sample();
        entries.insert("bad".to_string(), Value::from(f64::INFINITY));

        let err = JsonCodec.encode_snapshot(&entries).unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
        assert!(err.to_string().contains("\"bad\""));
    }

    #[test]
    fn nested_non_finite_float_fails_to_encode() {
        let value = Value::Array(vec![Value::from(1i64), Value::from(f64::NAN)]);
        assert!(JsonCodec.encode(&value).is_err());
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = JsonCodec.decode_snapshot(b"{\"trunc").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn top_level_must_be_a_map() {
        let err = JsonCodec.decode_snapshot(b"[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn bad_base64_fails_to_decode() {
        assert!(JsonCodec.decode(br#"{"$bytes": "***"}"#).is_err());
    }

    #[test]
    fn tag_with_siblings_is_a_plain_map() {
        let value = JsonCodec.decode(br#"{"$bytes": "AQID", "other": 1}"#).unwrap();
        assert!(value.is_map());
    }

    fn single(key: &str, value: Value) -> Map {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        map
    }

    #[test]
    fn user_map_shaped_like_bytes_roundtrips() {
        for text in ["hello!", "AQID"] {
            let mut entries = sample();
            entries.insert(
                "user_map".to_string(),
                Value::Map(single("$bytes", Value::from(text))),
            );

            let bytes = JsonCodec.encode_snapshot(&entries).unwrap();
            let decoded = JsonCodec.decode_snapshot(&bytes).unwrap();
            assert_eq!(decoded, entries);
        }
    }

    #[test]
    fn user_map_shaped_like_escape_roundtrips() {
        let inner = Value::Map(single("a", Value::from(1i64)));
        let value = Value::Map(single("$map", inner));

        let bytes = JsonCodec.encode(&value).unwrap();
        assert_eq!(&bytes[..], br#"{"$map":{"$map":{"a":1}}}"#);
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn snapshot_with_tag_key_stays_a_map() {
        let entries = single("$bytes", Value::from("AQID"));
        let bytes = JsonCodec.encode_snapshot(&entries).unwrap();
        assert_eq!(JsonCodec.decode_snapshot(&bytes).unwrap(), entries);
    }

    #[test]
    fn unsigned_roundtrips_exactly() {
        let entries = single("big", Value::Unsigned(u64::MAX));
        let bytes = JsonCodec.encode_snapshot(&entries).unwrap();
        assert_eq!(&bytes[..], br#"{"big":18446744073709551615}"#);
        assert_eq!(JsonCodec.decode_snapshot(&bytes).unwrap(), entries);
    }
}
