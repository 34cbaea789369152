//! Row Value Module
//!
//! Defines the cell values a tabular row can hold and how raw text is typed.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One record of a dataset: column name to value, in column order.
pub type Row = IndexMap<String, Value>;

// == Value ==
/// A single cell value.
///
/// Serializes untagged, so a row encodes as a plain JSON object. Dates use
/// ISO-8601 text and are recovered on decode because date-shaped text is
/// always typed as a date by [`Value::infer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Empty cell
    Null,
    /// Integral number
    Int(i64),
    /// Finite floating point number
    Float(f64),
    /// Calendar date (`YYYY-MM-DD`)
    Date(NaiveDate),
    /// Date and time (`YYYY-MM-DDTHH:MM:SS`)
    DateTime(NaiveDateTime),
    /// Anything else
    Text(String),
}

impl Value {
    // == Type Inference ==
    /// Types a raw source cell.
    ///
    /// Tries integer, finite float, date, then date-time; falls back to text.
    /// An empty cell is `Null`.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(int) = raw.parse::<i64>() {
            return Value::Int(int);
        }
        if let Ok(float) = raw.parse::<f64>() {
            if float.is_finite() {
                return Value::Float(float);
            }
        }
        if let Ok(date) = raw.parse::<NaiveDate>() {
            return Value::Date(date);
        }
        if let Ok(datetime) = raw.parse::<NaiveDateTime>() {
            return Value::DateTime(datetime);
        }
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Value::DateTime(datetime);
        }
        Value::Text(raw.to_string())
    }

    /// Returns true for an empty cell.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Value {
    fn from(raw: &str) -> Self {
        Value::infer(raw)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_types() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("-3.5"), Value::Float(-3.5));
        assert_eq!(
            Value::infer("2015-01-01"),
            Value::Date(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
        );
        assert_eq!(Value::infer("AA"), Value::Text("AA".to_string()));
    }

    #[test]
    fn test_infer_rejects_non_finite_floats() {
        assert_eq!(Value::infer("NaN"), Value::Text("NaN".to_string()));
        assert_eq!(Value::infer("inf"), Value::Text("inf".to_string()));
    }

    #[test]
    fn test_infer_datetime_with_space_separator() {
        let expected = NaiveDate::from_ymd_opt(2015, 2, 3)
            .unwrap()
            .and_hms_opt(4, 5, 6)
            .unwrap();
        assert_eq!(
            Value::infer("2015-02-03 04:05:06"),
            Value::DateTime(expected)
        );
        assert_eq!(
            Value::infer("2015-02-03T04:05:06"),
            Value::DateTime(expected)
        );
    }

    #[test]
    fn test_serialize_untagged() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2015, 7, 4).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), r#""2015-07-04""#);
        assert_eq!(serde_json::to_string(&Value::Int(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn test_float_with_integral_value_stays_float() {
        let json = serde_json::to_string(&Value::Float(3.0)).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Float(3.0));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::Text("x".into()).as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(f64::NAN), Value::Null);
    }
}
