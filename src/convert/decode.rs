//! Document → mapping conversion.

use serde_json::Value as Json;

use super::scalar::{decode_base64, parse_instant};
use super::{BINARY_SUFFIX, ConvertError, Document, TIME_SUFFIX};
use crate::value::{Value, ValueMap};

/// Convert a JSON document back into a mapping.
///
/// Tag suffixes are recognized and stripped at the key level of each mapping:
/// a scalar under an `@ISOtime`/`@base64` key decodes to a single
/// timestamp/blob, an array under such a key decodes to a homogeneous list.
/// Nested mappings strip suffixes for their own keys; nested arrays never do
/// (stripping happens only once, at the immediate parent mapping).
///
/// The result is isomorphic to the mapping that produced the document, modulo
/// two documented lossy edges: integers narrower than 64-bit come back
/// widened, and a float whose JSON text has no fraction or exponent marker
/// comes back as an integer.
///
/// # Errors
///
/// Fails on the first malformed entry (bad instant text, bad base64, or a
/// tagged entry that is not text), naming the stored key and the raw text
/// encountered. Partial output is discarded.
pub fn to_mapping(doc: &Document) -> Result<ValueMap, ConvertError> {
    let mut out = ValueMap::new();
    for (key, json) in doc {
        if let Some(bare) = key.strip_suffix(TIME_SUFFIX) {
            let value = match json {
                Json::Array(items) => Value::List(decode_time_array(key, items)?),
                _ => Value::Timestamp(decode_time_entry(key, json)?),
            };
            out.insert(bare.to_string(), value);
        } else if let Some(bare) = key.strip_suffix(BINARY_SUFFIX) {
            let value = match json {
                Json::Array(items) => Value::List(decode_binary_array(key, items)?),
                _ => Value::Bytes(decode_binary_entry(key, json)?),
            };
            out.insert(bare.to_string(), value);
        } else {
            out.insert(key.clone(), decode_json(key, json)?);
        }
    }
    Ok(out)
}

/// Decode an untagged JSON value.
fn decode_json(key: &str, json: &Json) -> Result<Value, ConvertError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => decode_number(n),
        Json::String(s) => Value::Text(s.clone()),
        Json::Object(nested) => Value::Map(to_mapping(nested)?),
        Json::Array(items) => Value::List(decode_array(key, items)?),
    })
}

/// Integral when the numeric text has no fraction or exponent part, else
/// floating-point. Numbers outside the `i64` range also land on the float
/// side (width widening is already blessed by the wire contract).
fn decode_number(n: &serde_json::Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::MAX)),
    }
}

/// Decode a plain array element-wise. Inner keys never strip suffixes here;
/// nested objects strip at their own level through [`to_mapping`].
fn decode_array(key: &str, items: &[Json]) -> Result<Vec<Value>, ConvertError> {
    items.iter().map(|el| decode_json(key, el)).collect()
}

fn decode_time_array(key: &str, items: &[Json]) -> Result<Vec<Value>, ConvertError> {
    items
        .iter()
        .map(|el| decode_time_entry(key, el).map(Value::Timestamp))
        .collect()
}

fn decode_binary_array(key: &str, items: &[Json]) -> Result<Vec<Value>, ConvertError> {
    items
        .iter()
        .map(|el| decode_binary_entry(key, el).map(Value::Bytes))
        .collect()
}

fn decode_time_entry(key: &str, json: &Json) -> Result<chrono::DateTime<chrono::Utc>, ConvertError> {
    let text = expect_text(key, json)?;
    parse_instant(text).map_err(|source| ConvertError::MalformedTimestamp {
        key: key.to_string(),
        raw: text.to_string(),
        source,
    })
}

fn decode_binary_entry(key: &str, json: &Json) -> Result<Vec<u8>, ConvertError> {
    let text = expect_text(key, json)?;
    decode_base64(text).map_err(|source| ConvertError::MalformedBase64 {
        key: key.to_string(),
        raw: text.to_string(),
        source,
    })
}

fn expect_text<'a>(key: &str, json: &'a Json) -> Result<&'a str, ConvertError> {
    json.as_str().ok_or_else(|| ConvertError::ExpectedText {
        key: key.to_string(),
        raw: json.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn doc(text: &str) -> Document {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_scalar_timestamp_decodes_and_strips() {
        let map = to_mapping(&doc(r#"{"t@ISOtime":"2020-01-01T00:00:00Z"}"#)).unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(map["t"], Value::Timestamp(expected));
        assert!(!map.contains_key("t@ISOtime"));
    }

    #[test]
    fn test_timestamp_array_decodes_and_strips() {
        let map = to_mapping(&doc(
            r#"{"t@ISOtime":["2020-01-01T00:00:00Z","2021-01-01T00:00:00Z"]}"#,
        ))
        .unwrap();
        let Value::List(items) = &map["t"] else {
            panic!("expected list, got {:?}", map["t"]);
        };
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Value::is_timestamp));
    }

    #[test]
    fn test_binary_decodes_and_strips() {
        let map = to_mapping(&doc(r#"{"b@base64":"AAEC"}"#)).unwrap();
        assert_eq!(map["b"], Value::Bytes(vec![0, 1, 2]));
    }

    #[test]
    fn test_number_dispatch() {
        let map = to_mapping(&doc(r#"{"i":7,"f":7.0,"e":7e0}"#)).unwrap();
        assert_eq!(map["i"], Value::Int(7));
        assert_eq!(map["f"], Value::Float(7.0));
        assert_eq!(map["e"], Value::Float(7.0));
    }

    #[test]
    fn test_malformed_timestamp_names_key() {
        let err = to_mapping(&doc(r#"{"t@ISOtime":"not-a-time"}"#)).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedTimestamp { .. }));
        assert!(err.to_string().contains('t'));
        assert!(err.to_string().contains("not-a-time"));
    }

    #[test]
    fn test_malformed_base64_names_key() {
        let err = to_mapping(&doc(r#"{"b@base64":"!!!"}"#)).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedBase64 { .. }));
    }

    #[test]
    fn test_tagged_entry_must_be_text() {
        let err = to_mapping(&doc(r#"{"t@ISOtime":12}"#)).unwrap_err();
        assert!(matches!(err, ConvertError::ExpectedText { .. }));
    }

    #[test]
    fn test_nested_arrays_do_not_strip() {
        // The suffix applies only at the immediate parent mapping's key level;
        // strings inside a nested plain array stay strings.
        let map = to_mapping(&doc(r#"{"xs":[["2020-01-01T00:00:00Z"]]}"#)).unwrap();
        let Value::List(outer) = &map["xs"] else { panic!() };
        let Value::List(inner) = &outer[0] else { panic!() };
        assert_eq!(inner[0], Value::Text("2020-01-01T00:00:00Z".into()));
    }

    #[test]
    fn test_nested_object_strips_its_own_keys() {
        let map = to_mapping(&doc(r#"{"outer":{"t@ISOtime":"2020-01-01T00:00:00Z"}}"#)).unwrap();
        let Value::Map(inner) = &map["outer"] else { panic!() };
        assert!(inner.contains_key("t"));
    }
}
