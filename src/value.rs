//! In-memory values produced by presenters, and the date/time normalization passes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A presented record after post-processing: output key to value.
pub type Struct = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Calendar date without time; rendered `YYYY-MM-DD`.
    Date(NaiveDate),
    /// Timestamp; rendered as Unix epoch seconds.
    DateTime(DateTime<Utc>),
    List(Vec<FieldValue>),
    Map(Struct),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering used by the in-memory store; values of different kinds compare by kind.
    pub fn compare(&self, other: &FieldValue) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use FieldValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
            (String(a), String(b)) => a.cmp(b),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) | FieldValue::Float(_) => 2,
            FieldValue::String(_) => 3,
            FieldValue::Date(_) => 4,
            FieldValue::DateTime(_) => 5,
            FieldValue::List(_) => 6,
            FieldValue::Map(_) => 7,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::Number((*n).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Date(d) => Value::String(format_date(d)),
            FieldValue::DateTime(t) => Value::Number(t.timestamp().into()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Rewrites every calendar date (not timestamps) to a `YYYY-MM-DD` string, through maps and lists.
pub fn dates_to_strings(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Date(d) => FieldValue::String(format_date(&d)),
        FieldValue::List(items) => FieldValue::List(items.into_iter().map(dates_to_strings).collect()),
        FieldValue::Map(map) => FieldValue::Map(
            map.into_iter()
                .map(|(k, v)| (k, dates_to_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Rewrites every timestamp to integer epoch seconds, through maps and lists.
pub fn datetimes_to_epoch(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::DateTime(t) => FieldValue::Int(t.timestamp()),
        FieldValue::List(items) => FieldValue::List(items.into_iter().map(datetimes_to_epoch).collect()),
        FieldValue::Map(map) => FieldValue::Map(
            map.into_iter()
                .map(|(k, v)| (k, datetimes_to_epoch(v)))
                .collect(),
        ),
        other => other,
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(n) => serializer.serialize_i64(*n),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Date(d) => serializer.serialize_str(&format_date(d)),
            FieldValue::DateTime(t) => serializer.serialize_i64(t.timestamp()),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::DateTime(t)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Struct> for FieldValue {
    fn from(map: Struct) -> Self {
        FieldValue::Map(map)
    }
}
