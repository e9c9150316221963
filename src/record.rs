//! The record contract: what presenters and the pipeline need from a domain record.

use crate::value::FieldValue;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A domain record as seen by presenters.
pub trait Record: Send + Sync + fmt::Debug {
    /// Type identifier used for presenter lookup (e.g. "Workspace").
    fn record_type(&self) -> &str;

    fn id(&self) -> i64;

    /// Attribute or column value; `None` when the record has no such attribute.
    fn attribute(&self, name: &str) -> Option<FieldValue>;

    /// Whether `name` is a stored column (foreign keys such as `user_id` included).
    fn has_column(&self, name: &str) -> bool;

    /// Metadata for an association this record type declares.
    fn reflection(&self, association: &str) -> Option<Reflection>;

    /// Related record(s) reachable through `name`.
    fn association(&self, name: &str) -> Option<Related>;
}

pub type RecordRef = Arc<dyn Record>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reflection {
    pub name: String,
    pub target_type: String,
    /// Table of the related records; default output key for included records.
    pub table_name: String,
    pub collection: bool,
}

#[derive(Clone, Debug)]
pub enum Related {
    One(RecordRef),
    Many(Vec<RecordRef>),
    /// Non-record result (a computed scalar or list of scalars).
    Value(FieldValue),
}

impl Related {
    /// Related records, ignoring non-record values.
    pub fn records(&self) -> Vec<RecordRef> {
        match self {
            Related::One(r) => vec![Arc::clone(r)],
            Related::Many(rs) => rs.clone(),
            Related::Value(_) => Vec::new(),
        }
    }

    /// Id (or raw value) of a singular result, ids of a collection.
    pub fn ids(&self) -> FieldValue {
        match self {
            Related::One(r) => FieldValue::Int(r.id()),
            Related::Many(rs) => FieldValue::List(rs.iter().map(|r| FieldValue::Int(r.id())).collect()),
            Related::Value(v) => v.clone(),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Related::Many(_) | Related::Value(FieldValue::List(_)))
    }
}

/// Removes later duplicates (same type and id), keeping first-seen order.
pub fn dedup_records(records: Vec<RecordRef>) -> Vec<RecordRef> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.record_type().to_string(), r.id())))
        .collect()
}
