//! Value types for SQL parameters

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A SQL value that can be bound to a named marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
}

/// How the driver should bind a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    Str,
    Int,
    Bool,
}

impl fmt::Display for BindKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindKind::Str => write!(f, "str"),
            BindKind::Int => write!(f, "int"),
            BindKind::Bool => write!(f, "bool"),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, whitespace-only strings and empty byte strings are blank.
    /// Numbers and booleans never are.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => crate::util::is_blank(s),
            Value::Bytes(b) => b.is_empty(),
            Value::Bool(_) | Value::I32(_) | Value::I64(_) | Value::F64(_) => false,
        }
    }

    /// The bind kind inferred from the native representation; anything that
    /// is not an integer or a boolean binds as a string
    pub fn bind_kind(&self) -> BindKind {
        match self {
            Value::I32(_) | Value::I64(_) => BindKind::Int,
            Value::Bool(_) => BindKind::Bool,
            _ => BindKind::Str,
        }
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F64(_) => "DOUBLE",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(i) => Some(i64::from(*i)),
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I32(i) => Some(f64::from(*i)),
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to a JSON value for row deserialization
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I32(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            Value::I64(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(
                b.iter()
                    .map(|byte| serde_json::Value::Number(serde_json::Number::from(*byte)))
                    .collect(),
            ),
        }
    }
}

/// Numbers compare across widths, strings and booleans compare with their
/// own kind. Anything else is unordered.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(i64::from(val))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F64(f64::from(val))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.hyphenated().to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.format("%Y-%m-%d").to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(Value::from("").is_blank());
        assert!(Value::Bytes(Vec::new()).is_blank());
        assert!(!Value::from(0).is_blank());
        assert!(!Value::from(false).is_blank());
        assert!(!Value::from("j").is_blank());
    }

    #[test]
    fn test_bind_kinds() {
        assert_eq!(Value::from("john").bind_kind(), BindKind::Str);
        assert_eq!(Value::from(31).bind_kind(), BindKind::Int);
        assert_eq!(Value::from(31i64).bind_kind(), BindKind::Int);
        assert_eq!(Value::from(true).bind_kind(), BindKind::Bool);
        assert_eq!(Value::from(1.5).bind_kind(), BindKind::Str);
        assert_eq!(Value::Null.bind_kind(), BindKind::Str);
    }

    #[test]
    fn test_ordering_across_numeric_widths() {
        assert!(Value::from(20) > Value::from(10i64));
        assert!(Value::from(10.5) > Value::from(10));
        assert!(Value::from("b") > Value::from("a"));
        assert_eq!(Value::from("a").partial_cmp(&Value::from(1)), None);
        assert_eq!(Value::Null.partial_cmp(&Value::Null), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::I32(42).type_name(), "INTEGER");
        assert_eq!(Value::String("test".to_string()).type_name(), "TEXT");
        assert_eq!(Value::Bool(true).type_name(), "BOOLEAN");
        assert_eq!(Value::Null.type_name(), "NULL");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::from(3).to_json(), serde_json::json!(3));
        assert_eq!(Value::from("x").to_json(), serde_json::json!("x"));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    }
}
