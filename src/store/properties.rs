//! Line-oriented properties files and their number forms.
//!
//! The on-disk format is one `key=value` pair per line, with `#`/`!` comment
//! lines and blank lines ignored and keys trimmed. Files this crate creates
//! carry a leading creation-timestamp comment and sorted keys. Keys that
//! contain `=` or significant leading whitespace are out of contract.

use std::collections::BTreeMap;

use crate::value::Value;

/// A flat set of text properties.
pub type PropertyMap = BTreeMap<String, String>;

// =============================================================================
// Text format
// =============================================================================

/// Parse properties text.
pub(crate) fn parse(text: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for line in text.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                map.insert(key.trim().to_string(), value.to_string());
            }
            // A bare line is a key with an empty value.
            None => {
                map.insert(line.trim().to_string(), String::new());
            }
        }
    }
    map
}

/// Serialize properties text, optionally with a leading comment line.
pub(crate) fn serialize(map: &PropertyMap, comment: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(comment) = comment {
        out.push_str("# ");
        out.push_str(comment);
        out.push('\n');
    }
    for (key, value) in map {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

// =============================================================================
// Number forms
// =============================================================================

/// Parse a stored property as a number.
///
/// `inf`/`-inf` spell the infinities and `nan`/`NaN` spells NaN; text
/// containing a `.` parses as a float, anything else as an integer.
pub(crate) fn parse_number(text: &str) -> Option<Value> {
    match text {
        "inf" => Some(Value::Float(f64::INFINITY)),
        "-inf" => Some(Value::Float(f64::NEG_INFINITY)),
        "nan" | "NaN" => Some(Value::Float(f64::NAN)),
        _ if text.contains('.') => text.parse::<f64>().ok().map(Value::Float),
        _ => text.parse::<i64>().ok().map(Value::Int),
    }
}

/// Format a numeric [`Value`] as property text, the inverse of
/// [`parse_number`]. Returns `None` for non-numeric values.
pub(crate) fn format_number(value: &Value) -> Option<String> {
    match value {
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) if f.is_nan() => Some("nan".to_string()),
        Value::Float(f) if *f == f64::INFINITY => Some("inf".to_string()),
        Value::Float(f) if *f == f64::NEG_INFINITY => Some("-inf".to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let props = parse("# created 2020-01-01T00:00:00Z\n\nname=store\ncount=3\n");
        assert_eq!(props.len(), 2);
        assert_eq!(props["name"], "store");
        assert_eq!(props["count"], "3");
    }

    #[test]
    fn test_parse_keeps_value_verbatim() {
        let props = parse("url=https://example.org/?q=a=b\n");
        assert_eq!(props["url"], "https://example.org/?q=a=b");
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut props = PropertyMap::new();
        props.insert("b".into(), "two".into());
        props.insert("a".into(), "one".into());
        let text = serialize(&props, Some("created now"));
        assert!(text.starts_with("# created now\n"));
        assert_eq!(parse(&text), props);
    }

    #[test]
    fn test_number_specials() {
        assert_eq!(parse_number("inf"), Some(Value::Float(f64::INFINITY)));
        assert_eq!(parse_number("-inf"), Some(Value::Float(f64::NEG_INFINITY)));
        assert!(matches!(parse_number("nan"), Some(Value::Float(f)) if f.is_nan()));
        assert!(matches!(parse_number("NaN"), Some(Value::Float(f)) if f.is_nan()));
    }

    #[test]
    fn test_number_dispatch_on_decimal_point() {
        assert_eq!(parse_number("42"), Some(Value::Int(42)));
        assert_eq!(parse_number("42.5"), Some(Value::Float(42.5)));
        assert_eq!(parse_number("seven"), None);
    }

    #[test]
    fn test_format_number_inverse() {
        assert_eq!(format_number(&Value::Int(-3)).as_deref(), Some("-3"));
        assert_eq!(format_number(&Value::Float(2.5)).as_deref(), Some("2.5"));
        assert_eq!(format_number(&Value::Float(f64::INFINITY)).as_deref(), Some("inf"));
        assert_eq!(format_number(&Value::from("x")), None);
    }
}
