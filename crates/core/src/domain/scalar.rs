// Scalar query result

use serde::Serialize;
use std::fmt;

/// First column of the first row returned by the diagnostic command
///
/// A command that returns no rows yields `Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Bytes(Vec<u8>),
    /// A value of a type the adapter does not decode, kept by type name
    Other(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Integer view, for callers encoding numeric thresholds
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(v) => Some(*v),
            ScalarValue::Bool(b) => Some(i64::from(*b)),
            ScalarValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Real(v) => Some(*v),
            ScalarValue::Integer(v) => Some(*v as f64),
            ScalarValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Integer(v) => write!(f, "{}", v),
            ScalarValue::Real(v) => write!(f, "{}", v),
            ScalarValue::Text(s) => f.write_str(s),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            ScalarValue::Other(type_name) => write!(f, "<{}>", type_name),
        }
    }
}
