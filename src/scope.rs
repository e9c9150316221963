//! Query-capability contract consumed from the storage layer.
//!
//! A scope is an unevaluated, chainable query description. Chaining methods
//! return a new scope and leave the receiver untouched.

use crate::error::ScopeError;
use crate::record::RecordRef;
use crate::value::FieldValue;
use std::fmt;

pub type BoxScope = Box<dyn Scope>;

pub trait Scope: Send + Sync + fmt::Debug {
    fn record_type(&self) -> &str;

    fn id_column(&self) -> &str {
        "id"
    }

    fn limit(&self, n: u64) -> BoxScope;

    fn offset(&self, n: u64) -> BoxScope;

    fn where_ids_in(&self, ids: &[i64]) -> BoxScope;

    fn where_condition(&self, condition: Condition) -> BoxScope;

    /// Appends an ordering term; earlier terms take precedence.
    fn order(&self, column: &str, direction: Direction) -> BoxScope;

    fn count(&self) -> Result<u64, ScopeError>;

    fn distinct_count(&self, id_column: &str) -> Result<u64, ScopeError>;

    fn to_list(&self) -> Result<Vec<RecordRef>, ScopeError>;

    /// Loads `associations` for every record in one batch.
    fn preload(&self, records: &[RecordRef], associations: &[String]) -> Result<(), ScopeError>;
}

/// Hands out base scopes by record type (the storage layer's entry point).
pub trait ScopeSource: Send + Sync {
    fn scope_for(&self, record_type: &str) -> Option<BoxScope>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Only an explicit "desc" sorts descending.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("desc") => Direction::Desc,
            _ => Direction::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Case-insensitive substring match on string columns.
    Contains,
    IsNull,
    NotNull,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: Operator,
    pub value: FieldValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(column, Operator::Eq, value)
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(column, Operator::Contains, FieldValue::String(needle.into()))
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, Operator::IsNull, FieldValue::Null)
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self::new(column, Operator::NotNull, FieldValue::Null)
    }

    /// Evaluates against a single attribute value (absent attributes are null).
    pub fn matches(&self, actual: Option<&FieldValue>) -> bool {
        use std::cmp::Ordering;
        let actual = actual.unwrap_or(&FieldValue::Null);
        match self.op {
            Operator::IsNull => actual.is_null(),
            Operator::NotNull => !actual.is_null(),
            Operator::Eq => actual.compare(&self.value) == Ordering::Equal,
            Operator::NotEq => actual.compare(&self.value) != Ordering::Equal,
            Operator::Lt => !actual.is_null() && actual.compare(&self.value) == Ordering::Less,
            Operator::Lte => !actual.is_null() && actual.compare(&self.value) != Ordering::Greater,
            Operator::Gt => !actual.is_null() && actual.compare(&self.value) == Ordering::Greater,
            Operator::Gte => !actual.is_null() && actual.compare(&self.value) != Ordering::Less,
            Operator::Contains => match (actual.as_str(), self.value.as_str()) {
                (Some(hay), Some(needle)) => hay.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
        }
    }
}
