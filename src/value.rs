//! The dynamically-typed value model the store operates on.
//!
//! [`Value`] is the closed union of everything a data map can hold. The
//! conversion engine in [`crate::convert`] matches exhaustively over it, so
//! adding a variant is a compile error at every dispatch site rather than a
//! silent fall-through to "unsupported".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A mapping from text keys to values.
///
/// Keys are unique; ordering is not significant to the wire format, but a
/// `BTreeMap` keeps serialization deterministic.
pub type ValueMap = BTreeMap<String, Value>;

// =============================================================================
// Value
// =============================================================================

/// A dynamically-typed value.
///
/// Timestamps and binary blobs have no native JSON representation; the
/// conversion engine carries them through JSON via reserved key suffixes
/// (see [`crate::convert::TIME_SUFFIX`] and [`crate::convert::BINARY_SUFFIX`]).
///
/// # Example
///
/// ```ignore
/// use zipstore::{Value, ValueMap};
///
/// let mut map = ValueMap::new();
/// map.insert("name".into(), Value::from("example"));
/// map.insert("count".into(), Value::from(3_i64));
/// map.insert("icon".into(), Value::Bytes(vec![0x89, 0x50, 0x4e, 0x47]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent/null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer. Narrower integers widen to this on read.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// Text.
    Text(String),
    /// An instant in time, UTC, no calendar fields.
    Timestamp(DateTime<Utc>),
    /// An arbitrary byte sequence.
    Bytes(Vec<u8>),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested mapping.
    Map(ValueMap),
}

impl Value {
    /// The kind of this value, for classification and error messages.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Whether this value is a timestamp.
    pub fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    /// Whether this value is a binary blob.
    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    /// Whether this value is numeric (integer or floating-point).
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

// =============================================================================
// ValueKind
// =============================================================================

/// Discriminant of a [`Value`], used in error messages and homogeneity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// See [`Value::Null`].
    Null,
    /// See [`Value::Bool`].
    Bool,
    /// See [`Value::Int`].
    Int,
    /// See [`Value::Float`].
    Float,
    /// See [`Value::Text`].
    Text,
    /// See [`Value::Timestamp`].
    Timestamp,
    /// See [`Value::Bytes`].
    Bytes,
    /// See [`Value::List`].
    List,
    /// See [`Value::Map`].
    Map,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Bytes => "binary",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}

// =============================================================================
// List homogeneity
// =============================================================================

/// Whether every element of a non-empty list is a timestamp.
///
/// Empty lists are not homogeneous; they serialize element-wise (that is,
/// as an empty untagged array).
pub(crate) fn is_time_list(list: &[Value]) -> bool {
    !list.is_empty() && list.iter().all(Value::is_timestamp)
}

/// Whether every element of a non-empty list is a binary blob.
pub(crate) fn is_binary_list(list: &[Value]) -> bool {
    !list.is_empty() && list.iter().all(Value::is_binary)
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_display() {
        assert_eq!(Value::Null.kind().to_string(), "null");
        assert_eq!(Value::Bytes(vec![]).kind().to_string(), "binary");
        assert_eq!(Value::from(1.5).kind().to_string(), "float");
    }

    #[test]
    fn test_time_list_homogeneity() {
        let t = Value::Timestamp(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert!(is_time_list(&[t.clone(), t.clone()]));
        assert!(!is_time_list(&[]));
        assert!(!is_time_list(&[t, Value::from(1_i64)]));
    }

    #[test]
    fn test_binary_list_homogeneity() {
        let b = Value::Bytes(vec![1, 2]);
        assert!(is_binary_list(&[b.clone()]));
        assert!(!is_binary_list(&[]));
        assert!(!is_binary_list(&[b, Value::Null]));
    }

    #[test]
    fn test_structural_equality() {
        let mut a = ValueMap::new();
        a.insert("x".into(), Value::from(1_i64));
        let mut b = ValueMap::new();
        b.insert("x".into(), Value::from(1_i64));
        assert_eq!(Value::Map(a), Value::Map(b));
    }
}
