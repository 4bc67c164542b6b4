//! Round-trip properties of the conversion engine.

use chrono::{Duration, TimeZone, Utc};

use super::{to_document, to_mapping};
use crate::value::{Value, ValueMap};

fn sample_mapping() -> ValueMap {
    let stamp = Utc.with_ymd_and_hms(2015, 7, 23, 14, 34, 5).unwrap()
        + Duration::milliseconds(980);
    let mut nested = ValueMap::new();
    nested.insert("para".into(), Value::from("a meta-markup language"));
    nested.insert(
        "see_also".into(),
        Value::List(vec![Value::from("GML"), Value::from("XML")]),
    );

    let mut map = ValueMap::new();
    map.insert("title".into(), Value::from("example glossary"));
    map.insert("id".into(), Value::Int(8879));
    map.insert("ratio".into(), Value::Float(0.25));
    map.insert("active".into(), Value::Bool(true));
    map.insert("missing".into(), Value::Null);
    map.insert("accessed".into(), Value::Timestamp(stamp));
    map.insert("icon".into(), Value::Bytes((0..=255).collect()));
    map.insert(
        "stamps".into(),
        Value::List(vec![
            Value::Timestamp(stamp),
            Value::Timestamp(stamp + Duration::seconds(60)),
        ]),
    );
    map.insert(
        "chunks".into(),
        Value::List(vec![Value::Bytes(vec![0xde, 0xad]), Value::Bytes(vec![0xbe, 0xef])]),
    );
    map.insert(
        "mixed".into(),
        Value::List(vec![Value::Int(1), Value::from("two"), Value::Null]),
    );
    map.insert("detail".into(), Value::Map(nested));
    map
}

#[test]
fn test_round_trip_is_structural_identity() {
    let original = sample_mapping();
    let doc = to_document(&original).unwrap();
    let back = to_mapping(&doc).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_second_round_trip_has_no_drift() {
    let original = sample_mapping();
    let once = to_mapping(&to_document(&original).unwrap()).unwrap();
    let twice = to_mapping(&to_document(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_round_trip_through_json_text() {
    // The documents are a wire contract; they must survive an actual
    // serialize/parse cycle, not just in-memory tree equality.
    let original = sample_mapping();
    let text = serde_json::to_string(&to_document(&original).unwrap()).unwrap();
    let reparsed: super::Document = serde_json::from_str(&text).unwrap();
    assert_eq!(to_mapping(&reparsed).unwrap(), original);
}

#[test]
fn test_binary_wire_form() {
    let mut map = ValueMap::new();
    map.insert("b".into(), Value::Bytes((0..=255).collect()));
    let doc = to_document(&map).unwrap();
    assert!(doc.contains_key("b@base64"));
    let back = to_mapping(&doc).unwrap();
    assert_eq!(back["b"], Value::Bytes((0..=255).collect()));
}

#[test]
fn test_integral_float_returns_as_integer() {
    // Documented lossy edge: a float whose JSON text carries no fraction
    // marker comes back integral. serde_json always writes a `.0` for whole
    // f64s, so this is only observable on documents written by others.
    let doc: super::Document = serde_json::from_str(r#"{"x":3}"#).unwrap();
    assert_eq!(to_mapping(&doc).unwrap()["x"], Value::Int(3));
}

#[test]
fn test_suffix_exclusivity_scalar_vs_array() {
    let scalar: super::Document =
        serde_json::from_str(r#"{"t@ISOtime":"2020-01-01T00:00:00Z"}"#).unwrap();
    let array: super::Document =
        serde_json::from_str(r#"{"t@ISOtime":["2020-01-01T00:00:00Z","2021-01-01T00:00:00Z"]}"#)
            .unwrap();

    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

    assert_eq!(to_mapping(&scalar).unwrap()["t"], Value::Timestamp(t0));
    assert_eq!(
        to_mapping(&array).unwrap()["t"],
        Value::List(vec![Value::Timestamp(t0), Value::Timestamp(t1)])
    );
}
