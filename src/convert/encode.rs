//! Mapping → document conversion.

use serde_json::Value as Json;

use super::scalar::{encode_base64, format_instant};
use super::{BINARY_SUFFIX, ConvertError, Document, TIME_SUFFIX};
use crate::value::{Value, ValueMap, is_binary_list, is_time_list};

/// Convert a mapping into its JSON document form.
///
/// Tagged entries (timestamps, blobs, and homogeneous lists of either) get
/// their key suffixed per the wire convention; everything else maps onto the
/// native JSON kinds. Null values are written as JSON null under the original
/// key.
///
/// # Errors
///
/// Fails on the first unsupported entry (a timestamp or blob inside a mixed
/// list, or a non-finite float), naming the offending key. Partial output is
/// discarded.
pub fn to_document(map: &ValueMap) -> Result<Document, ConvertError> {
    let mut out = Document::new();
    for (key, value) in map {
        match value {
            Value::Null => {
                out.insert(key.clone(), Json::Null);
            }
            Value::Bool(b) => {
                out.insert(key.clone(), Json::Bool(*b));
            }
            Value::Int(i) => {
                out.insert(key.clone(), Json::Number((*i).into()));
            }
            Value::Float(f) => {
                out.insert(key.clone(), float_to_json(key, *f)?);
            }
            Value::Text(text) => {
                out.insert(key.clone(), Json::String(text.clone()));
            }
            Value::Timestamp(t) => {
                let tagged = format!("{key}{TIME_SUFFIX}");
                out.insert(tagged, Json::String(format_instant(t)));
            }
            Value::Bytes(bytes) => {
                let tagged = format!("{key}{BINARY_SUFFIX}");
                out.insert(tagged, Json::String(encode_base64(bytes)));
            }
            Value::Map(nested) => {
                out.insert(key.clone(), Json::Object(to_document(nested)?));
            }
            Value::List(list) => {
                if is_time_list(list) {
                    let items = list
                        .iter()
                        .map(|el| match el {
                            Value::Timestamp(t) => Json::String(format_instant(t)),
                            _ => unreachable!("is_time_list checked every element"),
                        })
                        .collect();
                    out.insert(format!("{key}{TIME_SUFFIX}"), Json::Array(items));
                } else if is_binary_list(list) {
                    let items = list
                        .iter()
                        .map(|el| match el {
                            Value::Bytes(b) => Json::String(encode_base64(b)),
                            _ => unreachable!("is_binary_list checked every element"),
                        })
                        .collect();
                    out.insert(format!("{key}{BINARY_SUFFIX}"), Json::Array(items));
                } else {
                    out.insert(key.clone(), Json::Array(encode_list(key, list)?));
                }
            }
        }
    }
    Ok(out)
}

/// Encode a mixed (non-homogeneous) list element-wise.
///
/// Timestamps and blobs are rejected here: with no key available, their
/// suffix tag has nowhere to go and the type would be silently lost.
fn encode_list(key: &str, list: &[Value]) -> Result<Vec<Json>, ConvertError> {
    list.iter()
        .map(|el| match el {
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Int(i) => Ok(Json::Number((*i).into())),
            Value::Float(f) => float_to_json(key, *f),
            Value::Text(text) => Ok(Json::String(text.clone())),
            Value::Map(nested) => Ok(Json::Object(to_document(nested)?)),
            Value::List(nested) => Ok(Json::Array(encode_list(key, nested)?)),
            Value::Timestamp(_) | Value::Bytes(_) => {
                Err(ConvertError::UnsupportedListElement {
                    key: key.to_string(),
                    kind: el.kind(),
                })
            }
        })
        .collect()
}

fn float_to_json(key: &str, f: f64) -> Result<Json, ConvertError> {
    serde_json::Number::from_f64(f)
        .map(Json::Number)
        .ok_or_else(|| ConvertError::NonFiniteFloat { key: key.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn map(entries: Vec<(&str, Value)>) -> ValueMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_scalars_use_native_kinds() {
        let doc = to_document(&map(vec![
            ("b", Value::Bool(true)),
            ("i", Value::Int(42)),
            ("f", Value::Float(2.5)),
            ("s", Value::from("hi")),
            ("n", Value::Null),
        ]))
        .unwrap();
        assert_eq!(serde_json::to_string(&doc["i"]).unwrap(), "42");
        assert_eq!(serde_json::to_string(&doc["f"]).unwrap(), "2.5");
        assert_eq!(doc["n"], Json::Null);
    }

    #[test]
    fn test_timestamp_tags_key() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let doc = to_document(&map(vec![("stamp", Value::Timestamp(t))])).unwrap();
        assert_eq!(doc["stamp@ISOtime"], Json::String("2020-01-01T00:00:00Z".into()));
        assert!(!doc.contains_key("stamp"));
    }

    #[test]
    fn test_bytes_tag_key() {
        let doc = to_document(&map(vec![("b", Value::Bytes(vec![0, 1, 2]))])).unwrap();
        assert_eq!(doc["b@base64"], Json::String("AAEC".into()));
    }

    #[test]
    fn test_homogeneous_time_list_tags_key() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let doc = to_document(&map(vec![(
            "ts",
            Value::List(vec![Value::Timestamp(t), Value::Timestamp(t)]),
        )]))
        .unwrap();
        assert!(doc["ts@ISOtime"].is_array());
    }

    #[test]
    fn test_mixed_list_with_timestamp_fails() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let err = to_document(&map(vec![(
            "xs",
            Value::List(vec![Value::Int(1), Value::Timestamp(t)]),
        )]))
        .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedListElement { .. }));
        assert!(err.to_string().contains("xs"));
    }

    #[test]
    fn test_empty_list_is_plain_array() {
        let doc = to_document(&map(vec![("xs", Value::List(vec![]))])).unwrap();
        assert_eq!(doc["xs"], Json::Array(vec![]));
    }

    #[test]
    fn test_non_finite_float_fails() {
        let err = to_document(&map(vec![("f", Value::Float(f64::NAN))])).unwrap_err();
        assert!(matches!(err, ConvertError::NonFiniteFloat { .. }));
    }
}
